//! Domain types for Caviardeur.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Documents** ([`Document`], [`TextFragment`]) exchanged with format readers and writers
//! - **Char-offset helpers** ([`CharIndex`]) shared by detectors and the pseudonymizer
//! - **Error types** ([`CaviardeurError`], [`ModelError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, CaviardeurError>`]:
//!
//! ```rust,no_run
//! use caviardeur::domain::{CaviardeurError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = caviardeur::config::load_config("caviardeur.toml")?;
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod errors;
pub mod result;
pub mod text;

// Re-export commonly used types for convenience
pub use document::{Document, TextFragment};
pub use errors::{CaviardeurError, ModelError};
pub use result::Result;
pub use text::CharIndex;
