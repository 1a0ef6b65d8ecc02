//! Configuration schema types
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration.

use crate::detection::ner::model::DEFAULT_MAX_SEQUENCE_LENGTH;
use crate::detection::ner::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_WINDOW_OVERLAP, DEFAULT_WINDOW_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Caviardeur configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaviardeurConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Entity detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Audit log settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CaviardeurConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.detection.validate()?;
        self.output.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (detect and report, write nothing)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Entity detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Token-classification model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Directory holding one sub-directory per model identifier
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Run the sequence-labeling detector
    #[serde(default = "default_true")]
    pub ner_enabled: bool,

    /// Minimum score for model detections (0.0 - 1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Sliding window size in chars
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Overlap between consecutive windows in chars
    #[serde(default = "default_window_overlap")]
    pub window_overlap: usize,

    /// Maximum model input length, special tokens included
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,

    /// Custom pattern library (TOML); the built-in French patterns otherwise
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,
}

impl DetectionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.model_id.trim().is_empty() {
            return Err("detection.model_id cannot be empty".to_string());
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "detection.confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            ));
        }

        if self.window_size == 0 {
            return Err("detection.window_size must be > 0".to_string());
        }

        if self.window_overlap >= self.window_size {
            return Err(format!(
                "detection.window_overlap ({}) must be smaller than detection.window_size ({})",
                self.window_overlap, self.window_size
            ));
        }

        if self.max_sequence_length < 2 {
            return Err("detection.max_sequence_length must be >= 2".to_string());
        }

        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            models_dir: default_models_dir(),
            ner_enabled: true,
            confidence_threshold: default_confidence_threshold(),
            window_size: default_window_size(),
            window_overlap: default_window_overlap(),
            max_sequence_length: default_max_sequence_length(),
            pattern_library: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving pseudonymized documents and the mapping
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Existing mapping to continue numbering from
    #[serde(default)]
    pub mapping_path: Option<PathBuf>,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("output.output_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            mapping_path: None,
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Append one entry per pseudonymized document
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// JSON lines instead of plain text
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path cannot be empty when audit is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_model_id() -> String {
    "Jean-Baptiste/camembert-ner-with-dates".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_window_overlap() -> usize {
    DEFAULT_WINDOW_OVERLAP
}

fn default_max_sequence_length() -> usize {
    DEFAULT_MAX_SEQUENCE_LENGTH
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("output/audit.log")
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
