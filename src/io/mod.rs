//! Document input and output
//!
//! The [`DocumentReader`]/[`DocumentWriter`] traits form the contract with
//! format adapters; [`FormatRegistry`] dispatches on file extension.

pub mod registry;
pub mod text;
pub mod traits;

pub use registry::{list_supported_files, output_path, FormatRegistry};
pub use text::{PlainTextReader, PlainTextWriter};
pub use traits::{DocumentReader, DocumentWriter};
