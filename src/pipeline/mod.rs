//! Batch pseudonymization pipeline
//!
//! [`DocumentProcessor`] drives detection and pseudonymization over files,
//! [`BatchReport`] summarises a run and [`AuditLogger`] keeps an optional
//! hashed trail of every pseudonymized document.
//!
//! # Example
//!
//! ```no_run
//! use caviardeur::config::CaviardeurConfig;
//! use caviardeur::io::list_supported_files;
//! use caviardeur::pipeline::DocumentProcessor;
//! use caviardeur::pseudonymizer::MappingStore;
//! use std::path::Path;
//!
//! # fn example() -> caviardeur::domain::Result<()> {
//! let config = CaviardeurConfig::default();
//! let processor = DocumentProcessor::from_config(&config)?;
//! let files = list_supported_files(Path::new("documents"))?;
//!
//! let mut mapping = MappingStore::new();
//! let report = processor.process_batch(&files, &mut mapping, |_, _| {});
//! println!("{}", report.format_console());
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod processor;
pub mod report;

pub use audit::AuditLogger;
pub use processor::{build_ner_detector, DocumentProcessor, FileOutcome, ProcessedDocument};
pub use report::{format_detection_table, BatchReport};
