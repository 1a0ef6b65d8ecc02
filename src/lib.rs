// Caviardeur - Pseudonymization of personal data in documents
// Copyright (c) 2025 Caviardeur Contributors
// Licensed under the MIT License

//! # Caviardeur - pseudonymization of personal data
//!
//! Caviardeur finds personal data in the text extracted from documents
//! (person names, company names, postal addresses, business registration
//! numbers) and replaces each distinct value with a stable, numbered
//! pseudonym such as `PERSON_001`. A mapping file records every pseudonym so
//! the originals can be restored later.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`pipeline`] - Per-document processing, batch driver, report and audit log
//! - [`detection`] - Regex/checksum and sequence-labeling detectors, overlap resolution
//! - [`pseudonymizer`] - Fragment-aware replacement and the mapping store
//! - [`io`] - Document reader/writer contract and the plain-text format
//! - [`domain`] - Core types, char-offset helpers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use caviardeur::detection::{detect_all, RegexDetector};
//! use caviardeur::domain::{Document, TextFragment};
//! use caviardeur::pseudonymizer::{pseudonymize, MappingStore};
//! use serde_json::{json, Map};
//!
//! # fn example() -> caviardeur::domain::Result<()> {
//! let document = Document::new(
//!     vec![TextFragment::new(
//!         "SIRET 732 829 320 00074, 12 rue de la Paix, 75002 Paris",
//!         json!({"type": "txt"}),
//!     )],
//!     Map::new(),
//! );
//!
//! let patterns = RegexDetector::new()?;
//! let entities = detect_all(&document.flattened_text(), &patterns, None)?;
//!
//! let mut mapping = MappingStore::new();
//! let pseudonymized = pseudonymize(&document, &entities, &mut mapping)?;
//! println!("{}", pseudonymized.flattened_text());
//! mapping.save("output/mapping.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Sequence-labeling model
//!
//! Person and company names come from a token-classification model run over
//! overlapping windows. The inference runtime plugs in through
//! [`detection::ner::InferenceBackend`], and [`detection::ner::CandleBackend`]
//! runs exported RoBERTa-family checkpoints locally. Models are loaded once
//! per identifier by [`detection::ner::ModelCache`].
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], whose error type is
//! [`domain::CaviardeurError`].
//!
//! ## Logging
//!
//! Caviardeur uses structured logging with the `tracing` crate. Detected
//! values are never logged; only categories, offsets and counts.

pub mod cli;
pub mod config;
pub mod detection;
pub mod domain;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod pseudonymizer;
