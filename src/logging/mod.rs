//! Logging and observability
//!
//! Structured logging with configurable levels, console output and optional
//! JSON file logging with rotation.
//!
//! # Example
//!
//! ```no_run
//! use caviardeur::logging::init_logging;
//! use caviardeur::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a document
///
/// # Example
///
/// ```no_run
/// use caviardeur::log_document_start;
/// use std::path::Path;
///
/// log_document_start!(Path::new("contrat.txt"), 3, 12);
/// ```
#[macro_export]
macro_rules! log_document_start {
    ($path:expr, $index:expr, $total:expr) => {
        tracing::info!(
            file = %$path.display(),
            index = $index,
            total = $total,
            "Processing document"
        );
    };
}

/// Log the completion of a document
///
/// # Example
///
/// ```no_run
/// use caviardeur::log_document_complete;
/// use std::path::Path;
/// use std::time::Duration;
///
/// log_document_complete!(Path::new("contrat.txt"), 7, Duration::from_millis(120));
/// ```
#[macro_export]
macro_rules! log_document_complete {
    ($path:expr, $entities:expr, $duration:expr) => {
        tracing::info!(
            file = %$path.display(),
            entities = $entities,
            duration_ms = $duration.as_millis(),
            "Document processed"
        );
    };
}

/// Log the completion of a batch
///
/// # Example
///
/// ```no_run
/// use caviardeur::log_batch_complete;
/// use std::time::Duration;
///
/// log_batch_complete!(10, 1, Duration::from_secs(4));
/// ```
#[macro_export]
macro_rules! log_batch_complete {
    ($processed:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            processed = $processed,
            failed = $failed,
            duration_ms = $duration.as_millis(),
            "Batch completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use caviardeur::log_error_with_context;
/// use caviardeur::domain::CaviardeurError;
///
/// let error = CaviardeurError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
