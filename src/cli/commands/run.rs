//! Run command implementation
//!
//! This module implements the `run` command: batch detection and
//! pseudonymization of a file or a directory of documents.

use crate::cli::resolve_config;
use crate::detection::ner::{CandleBackend, ModelCache};
use crate::io::list_supported_files;
use crate::pipeline::{build_ner_detector, format_detection_table, DocumentProcessor, FileOutcome};
use crate::pseudonymizer::MappingStore;
use clap::Args;
use std::path::PathBuf;

/// Mapping file name inside the output directory
pub const MAPPING_FILE_NAME: &str = "mapping.json";

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input file or directory
    pub input: PathBuf,

    /// Output directory (overrides output.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Detect and report only, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Confidence threshold for model detections (0.0 - 1.0)
    #[arg(short = 'c', long = "confidence", value_name = "CONF")]
    pub confidence: Option<f32>,

    /// Existing mapping to continue numbering from
    #[arg(short, long, value_name = "MAPPING")]
    pub mapping: Option<PathBuf>,

    /// Also write the report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    /// Execute the run command
    pub fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting run command");

        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(output) = &self.output {
            config.output.output_dir = output.clone();
        }
        if self.dry_run {
            config.application.dry_run = true;
        }
        if let Some(confidence) = self.confidence {
            tracing::info!(confidence, "Overriding confidence threshold from CLI");
            config.detection.confidence_threshold = confidence;
        }
        if let Some(mapping) = &self.mapping {
            config.output.mapping_path = Some(mapping.clone());
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let files = match list_supported_files(&self.input) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(1);
            }
        };
        if files.is_empty() {
            println!("No supported files found in {}", self.input.display());
            return Ok(1); // No input files exit code
        }

        let mut mapping = match &config.output.mapping_path {
            Some(path) => match MappingStore::from_file(path) {
                Ok(store) => {
                    println!("🔑 Loaded {} mapping entries from {}", store.len(), path.display());
                    store
                }
                Err(e) => {
                    crate::log_error_with_context!(&e, "Failed to load mapping");
                    eprintln!("❌ Failed to load mapping {}: {e}", path.display());
                    return Ok(2);
                }
            },
            None => MappingStore::new(),
        };

        let mut models =
            ModelCache::new(&config.detection.models_dir, Box::new(CandleBackend::new()))
                .with_max_sequence_length(config.detection.max_sequence_length);

        let mut processor = match DocumentProcessor::from_config(&config) {
            Ok(p) => p,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to initialize pipeline");
                eprintln!("❌ Failed to initialize pipeline: {e}");
                return Ok(2);
            }
        };

        if config.detection.ner_enabled {
            let model_id = &config.detection.model_id;
            match models.get_or_load(model_id) {
                Ok(model) => match build_ner_detector(model, &config.detection) {
                    Ok(detector) => {
                        println!("🧠 Model {model_id} loaded");
                        processor = processor.with_ner(detector);
                    }
                    Err(e) => {
                        crate::log_error_with_context!(&e, "Invalid model detector settings");
                        eprintln!("❌ Invalid model detector settings: {e}");
                        return Ok(2);
                    }
                },
                Err(e) => {
                    crate::log_error_with_context!(&e, "Failed to load model");
                    eprintln!("❌ Failed to load model {model_id}: {e}");
                    processor = processor.with_unavailable_model(model_id.as_str(), e.to_string());
                }
            }
        }

        if processor.is_dry_run() {
            tracing::info!("Dry run mode enabled - no files will be written");
            println!("🔍 DRY RUN MODE - No files will be written");
        }
        println!("🚀 Processing {} file(s)...", files.len());

        let report = processor.process_batch(&files, &mut mapping, |path, outcome| {
            if let FileOutcome::Scanned { entities, .. } = outcome {
                print!("{}", format_detection_table(path, entities));
            }
        });

        print!("{}", report.format_console());

        if let Some(report_path) = &self.report {
            match report.write_to_file(report_path) {
                Ok(()) => println!("📄 Report written to {}", report_path.display()),
                Err(e) => {
                    tracing::warn!(error = %e, path = %report_path.display(), "Failed to write report");
                    eprintln!("⚠️  Failed to write report: {e}");
                }
            }
        }

        if !processor.is_dry_run() && report.total_entities > 0 {
            let mapping_path = config.output.output_dir.join(MAPPING_FILE_NAME);
            if let Err(e) = mapping.save(&mapping_path) {
                crate::log_error_with_context!(&e, "Failed to save mapping");
                eprintln!("❌ Failed to save mapping: {e}");
                return Ok(5); // Fatal error exit code
            }
            println!(
                "🔑 Mapping ({} entries) saved to {}",
                mapping.len(),
                mapping_path.display()
            );
            println!("   Keep this file private: it restores the original values.");
        }

        if report.has_failures() {
            println!("⚠️  Completed with {} failed document(s)", report.documents_failed);
            Ok(1) // Partial success
        } else {
            println!("✅ Done");
            Ok(0)
        }
    }
}
