//! Configuration management for Caviardeur.
//!
//! # Overview
//!
//! Caviardeur reads an optional TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CAVIARDEUR_<SECTION>_<KEY>` overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use caviardeur::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("caviardeur.toml")?;
//!
//! println!("Model: {}", config.detection.model_id);
//! println!("Output: {}", config.output.output_dir.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run mode
//! - [`DetectionConfig`] - Model, windowing and pattern settings
//! - [`OutputConfig`] - Output directory and mapping file
//! - [`AuditConfig`] - Audit log
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [detection]
//! model_id = "Jean-Baptiste/camembert-ner-with-dates"
//! models_dir = "${CAVIARDEUR_MODELS}"
//! confidence_threshold = 0.7
//!
//! [output]
//! output_dir = "output"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_default_config};
pub use schema::{
    ApplicationConfig, AuditConfig, CaviardeurConfig, DetectionConfig, LoggingConfig,
    OutputConfig,
};
