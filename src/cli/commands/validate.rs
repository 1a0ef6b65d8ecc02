//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Caviardeur configuration file.

use crate::cli::resolve_config;
use crate::detection::PatternRegistry;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let shown_path = config_path.unwrap_or(crate::cli::DEFAULT_CONFIG_FILE);
        tracing::info!(config_path = %shown_path, "Validating configuration");

        println!("🔍 Validating configuration: {shown_path}");
        println!();

        // Loading validates
        let config = match resolve_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let patterns = match &config.detection.pattern_library {
            Some(path) => PatternRegistry::from_file(path),
            None => PatternRegistry::default_patterns(),
        };
        let pattern_count = match patterns {
            Ok(registry) => registry.all_patterns().len(),
            Err(e) => {
                println!("❌ Pattern library is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Model: {}", config.detection.model_id);
        println!("  Models Directory: {}", config.detection.models_dir.display());
        println!("  Model Detection: {}", config.detection.ner_enabled);
        println!(
            "  Confidence Threshold: {:.2}",
            config.detection.confidence_threshold
        );
        println!(
            "  Window: {} chars, {} overlap",
            config.detection.window_size, config.detection.window_overlap
        );
        println!(
            "  Pattern Library: {} ({} patterns)",
            config
                .detection
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
            pattern_count
        );
        println!("  Output Directory: {}", config.output.output_dir.display());
        if let Some(mapping) = &config.output.mapping_path {
            println!("  Mapping: {}", mapping.display());
        }
        println!(
            "  Audit Log: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(0)
    }
}
