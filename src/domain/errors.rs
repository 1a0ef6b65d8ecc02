//! Domain error types
//!
//! This module defines the error hierarchy for Caviardeur.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Caviardeur error type
///
/// This is the primary error type used throughout the library.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CaviardeurError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Sequence-labeling model errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Entity detection errors
    #[error("Detection error: {0}")]
    Detection(String),

    /// Mapping store errors
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Document reading/writing errors
    #[error("Document error: {0}")]
    Document(String),

    /// Document format without a reader or writer
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Sequence-labeling model errors
///
/// Errors raised while loading or running the token-classification model.
/// Backend-specific error types are flattened to strings at this boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A model artifact (weights, tokenizer, config) could not be found
    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The model's config.json is missing required fields or is malformed
    #[error("Invalid model metadata: {0}")]
    InvalidMetadata(String),

    /// The subword tokenizer failed on a window
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// The inference call failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The classifier returned scores that don't line up with its input
    #[error("Unexpected model output shape: expected {expected} positions, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The model failed to load, so no document can be scanned with it
    #[error("Model '{model_id}' is unavailable: {reason}")]
    Unavailable { model_id: String, reason: String },
}

// Conversion from std::io::Error
impl From<std::io::Error> for CaviardeurError {
    fn from(err: std::io::Error) -> Self {
        CaviardeurError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CaviardeurError {
    fn from(err: serde_json::Error) -> Self {
        CaviardeurError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CaviardeurError {
    fn from(err: toml::de::Error) -> Self {
        CaviardeurError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from candle tensor errors
impl From<candle_core::Error> for CaviardeurError {
    fn from(err: candle_core::Error) -> Self {
        CaviardeurError::Model(ModelError::Inference(err.to_string()))
    }
}

// Conversion from regex compile errors
impl From<regex::Error> for CaviardeurError {
    fn from(err: regex::Error) -> Self {
        CaviardeurError::Configuration(format!("Invalid pattern: {err}"))
    }
}
