//! Document reader and writer traits
//!
//! These traits define the contract between format adapters and the core:
//! a reader turns a file into an ordered fragment sequence with opaque
//! locations, and a writer rebuilds a file from a document with the same
//! fragment count and order.

use crate::domain::{Document, Result};
use std::path::Path;

/// Extracts the text fragments of a document
pub trait DocumentReader: Send + Sync {
    /// Read the file at `path`
    ///
    /// Implementations set the `source_path` and `format` metadata keys.
    /// Fragment offsets may be left at zero; the core recomputes them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn read(&self, path: &Path) -> Result<Document>;
}

/// Rebuilds a document from rewritten fragments
pub trait DocumentWriter: Send + Sync {
    /// Write `document` to `output_path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn write(&self, document: &Document, output_path: &Path) -> Result<()>;
}
