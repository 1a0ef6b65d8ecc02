//! Document processing pipeline
//!
//! read → detect → (dry run: stop) → pseudonymize → write, per file, and a
//! batch driver that keeps going when a single document fails.

use super::audit::AuditLogger;
use super::report::BatchReport;
use crate::config::{CaviardeurConfig, DetectionConfig};
use crate::detection::ner::{NerModel, WindowConfig};
use crate::detection::{detect_all, DetectedEntity, NerDetector, PatternRegistry, RegexDetector};
use crate::domain::{Document, ModelError, Result};
use crate::io::{output_path, FormatRegistry};
use crate::pseudonymizer::{pseudonymize, MappingStore};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of processing one in-memory document
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Resolved detections, sorted by start offset
    pub entities: Vec<DetectedEntity>,

    /// Pseudonymized document; `None` in dry-run mode
    pub document: Option<Document>,
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// The document has no text
    Empty,

    /// The document was scanned
    Scanned {
        /// Resolved detections
        entities: Vec<DetectedEntity>,
        /// Written output, if any
        output: Option<PathBuf>,
        /// Processing time in milliseconds
        processing_time_ms: u64,
    },
}

/// Runs detection and pseudonymization over documents
///
/// The optional model detector borrows its model, typically from a
/// [`ModelCache`](crate::detection::ner::ModelCache) that outlives the
/// processor.
#[derive(Debug)]
pub struct DocumentProcessor<'m> {
    patterns: RegexDetector,
    ner: Option<NerDetector<'m>>,
    /// Model id and load failure; every detection fails while set
    unavailable_model: Option<(String, String)>,
    registry: FormatRegistry,
    output_dir: PathBuf,
    dry_run: bool,
    audit: Option<AuditLogger>,
}

impl<'m> DocumentProcessor<'m> {
    /// Create a processor with pattern detection only
    pub fn new(patterns: RegexDetector, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            patterns,
            ner: None,
            unavailable_model: None,
            registry: FormatRegistry::new(),
            output_dir: output_dir.into(),
            dry_run: false,
            audit: None,
        }
    }

    /// Create a processor from configuration
    ///
    /// Loads the pattern library and opens the audit log when enabled. The
    /// model detector is attached separately with [`Self::with_ner`].
    pub fn from_config(config: &CaviardeurConfig) -> Result<Self> {
        let registry = match &config.detection.pattern_library {
            Some(path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::default_patterns()?,
        };

        let mut processor = Self::new(
            RegexDetector::with_registry(registry),
            config.output.output_dir.clone(),
        )
        .with_dry_run(config.application.dry_run);

        if config.audit.enabled {
            processor = processor.with_audit(AuditLogger::new(
                config.audit.log_path.clone(),
                config.audit.json_format,
                true,
            )?);
        }

        Ok(processor)
    }

    /// Attach a model detector
    pub fn with_ner(mut self, ner: NerDetector<'m>) -> Self {
        self.ner = Some(ner);
        self.unavailable_model = None;
        self
    }

    /// Record that the configured model failed to load
    ///
    /// Documents then fail detection instead of being scanned by the
    /// pattern detectors alone.
    pub fn with_unavailable_model(
        mut self,
        model_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.ner = None;
        self.unavailable_model = Some((model_id.into(), reason.into()));
        self
    }

    /// Replace the format registry
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attach an audit logger
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Check if dry-run mode is enabled
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Check if a model detector is attached
    pub fn has_model(&self) -> bool {
        self.ner.is_some()
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Detect entities in a document's flattened text
    pub fn detect(&self, document: &Document) -> Result<Vec<DetectedEntity>> {
        if let Some((model_id, reason)) = &self.unavailable_model {
            return Err(ModelError::Unavailable {
                model_id: model_id.clone(),
                reason: reason.clone(),
            }
            .into());
        }
        detect_all(&document.flattened_text(), &self.patterns, self.ner.as_ref())
    }

    /// Detect, then pseudonymize unless in dry-run mode
    pub fn process_document(
        &self,
        document: &Document,
        mapping: &mut MappingStore,
    ) -> Result<ProcessedDocument> {
        let entities = self.detect(document)?;

        if self.dry_run {
            return Ok(ProcessedDocument {
                entities,
                document: None,
            });
        }

        let pseudonymized = pseudonymize(document, &entities, mapping)?;
        Ok(ProcessedDocument {
            entities,
            document: Some(pseudonymized),
        })
    }

    /// Read, process and write one file
    ///
    /// Nothing is written in dry-run mode or when no entity was found.
    pub fn process_file(&self, path: &Path, mapping: &mut MappingStore) -> Result<FileOutcome> {
        let start = Instant::now();

        let document = self.registry.read(path)?;
        if document.is_blank() {
            return Ok(FileOutcome::Empty);
        }

        let ProcessedDocument {
            entities,
            document: pseudonymized,
        } = self.process_document(&document, mapping)?;

        let mut output = None;
        if let Some(pseudonymized) = pseudonymized.filter(|_| !entities.is_empty()) {
            let target = output_path(path, &document, &self.output_dir);
            self.registry.write(&pseudonymized, &target)?;
            tracing::debug!(output = %target.display(), "Pseudonymized document written");
            output = Some(target);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;

        if let (Some(audit), Some(target)) = (&self.audit, &output) {
            if let Err(e) = audit.log_document(path, target, &entities, mapping, processing_time_ms)
            {
                tracing::warn!(error = %e, file = %path.display(), "Failed to write audit entry");
            }
        }

        Ok(FileOutcome::Scanned {
            entities,
            output,
            processing_time_ms,
        })
    }

    /// Process files in order, collecting a report
    ///
    /// A failing document is logged and recorded as a report warning; the
    /// batch carries on. `on_file` sees every successful outcome.
    pub fn process_batch(
        &self,
        files: &[PathBuf],
        mapping: &mut MappingStore,
        mut on_file: impl FnMut(&Path, &FileOutcome),
    ) -> BatchReport {
        let batch_start = Instant::now();
        let mut report = BatchReport::new(self.dry_run);

        for (index, path) in files.iter().enumerate() {
            crate::log_document_start!(path, index + 1, files.len());

            match self.process_file(path, mapping) {
                Ok(outcome) => {
                    match &outcome {
                        FileOutcome::Empty => report.add_skipped(path),
                        FileOutcome::Scanned {
                            entities,
                            output,
                            processing_time_ms,
                        } => {
                            report.add_document(
                                path,
                                entities,
                                output.is_some(),
                                *processing_time_ms,
                            );
                            crate::log_document_complete!(
                                path,
                                entities.len(),
                                Duration::from_millis(*processing_time_ms)
                            );
                        }
                    }
                    on_file(path, &outcome);
                }
                Err(e) => {
                    tracing::error!(error = ?e, file = %path.display(), "Failed to process document");
                    report.add_failure(path, &e);
                }
            }
        }

        crate::log_batch_complete!(
            report.documents_processed,
            report.documents_failed,
            batch_start.elapsed()
        );
        report
    }
}

/// Build a model detector with the configured window and threshold
pub fn build_ner_detector<'m>(
    model: &'m NerModel,
    config: &DetectionConfig,
) -> Result<NerDetector<'m>> {
    Ok(NerDetector::new(model)?
        .with_windows(WindowConfig::new(config.window_size, config.window_overlap)?)
        .with_confidence_threshold(config.confidence_threshold))
}
