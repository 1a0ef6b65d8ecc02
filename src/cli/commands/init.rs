//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Sample configuration written by `init`
pub const CONFIG_TEMPLATE: &str = r#"# Caviardeur Configuration File
# Pseudonymization of personal data in documents
#
# Every setting is optional. Values can reference environment variables
# with ${VAR_NAME}, and CAVIARDEUR_<SECTION>_<KEY> variables override them.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (detect and report, write nothing)
dry_run = false

# ============================================================================
# Detection
# ============================================================================
[detection]
# Token-classification model, looked up under models_dir/<model_id>, holding
# config.json, tokenizer.json and model.safetensors (or pytorch_model.bin)
model_id = "Jean-Baptiste/camembert-ner-with-dates"
models_dir = "models"

# Run the sequence-labeling model; documents fail if it cannot be loaded
ner_enabled = true

# Minimum score for model detections (0.0 - 1.0)
confidence_threshold = 0.7

# Sliding window over long texts, in characters (overlap < size)
window_size = 2000
window_overlap = 200

# Maximum model input length in tokens, special tokens included
max_sequence_length = 512

# Custom regex/checksum pattern library (built-in French patterns otherwise)
# pattern_library = "patterns/fr_patterns.toml"

# ============================================================================
# Output
# ============================================================================
[output]
# Pseudonymized documents and mapping.json are written here
output_dir = "output"

# Continue numbering from an existing mapping
# mapping_path = "output/mapping.json"

# ============================================================================
# Audit Log
# ============================================================================
[audit]
# One entry per pseudonymized document, detected values hashed (SHA-256)
enabled = false
log_path = "output/audit.log"
json_format = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files with rotation (daily, hourly, never)
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "caviardeur.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Caviardeur configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, CONFIG_TEMPLATE) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: caviardeur validate-config");
                println!("  3. Preview detections: caviardeur run <input> --dry-run");
                println!("  4. Pseudonymize: caviardeur run <input> -o output");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }
}
