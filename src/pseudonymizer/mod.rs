//! Pseudonymization engine and mapping store
//!
//! [`pseudonymize`] rewrites a [`Document`](crate::domain::Document) from a
//! resolved entity list; [`MappingStore`] keeps the pseudonym assignments
//! stable across the documents of a batch and, once saved, across runs.

pub mod engine;
pub mod mapping;

pub use engine::pseudonymize;
pub use mapping::{MappingStore, PseudonymRecord};
