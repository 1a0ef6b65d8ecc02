//! Batch reporting
//!
//! Summarises a batch run: document counts, detections per category and
//! per detector, a handful of sample detections and per-document warnings.

use crate::detection::{DetectedEntity, EntityCategory, EntityOrigin};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Maximum number of samples kept in a report
pub const MAX_SAMPLES: usize = 20;

/// Samples shown in the console report
const CONSOLE_SAMPLES: usize = 10;

/// Sample text longer than this is truncated
const SAMPLE_TEXT_LIMIT: usize = 60;

/// Batch report with detection statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Detection only, nothing written
    pub dry_run: bool,

    /// Documents read and scanned
    pub documents_processed: usize,

    /// Documents that failed to read, process or write
    pub documents_failed: usize,

    /// Documents without any text
    pub documents_skipped: usize,

    /// Pseudonymized documents written
    pub documents_written: usize,

    /// Total entities detected
    pub total_entities: usize,

    /// Detections by category
    pub entities_by_category: BTreeMap<EntityCategory, usize>,

    /// Detections by detector
    pub entities_by_origin: HashMap<EntityOrigin, usize>,

    /// Sample detections
    pub samples: Vec<DetectionSample>,

    /// Per-document failures and other warnings
    pub warnings: Vec<String>,

    /// Processing statistics
    pub stats: ProcessingStats,
}

/// Sample detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSample {
    /// Document file name
    pub document: String,

    /// Detected text (truncated)
    pub text: String,

    /// Entity category
    pub category: EntityCategory,

    /// Detector that found it
    pub origin: EntityOrigin,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Documents with at least one detection
    pub documents_with_pii: usize,

    /// Documents without detections
    pub documents_without_pii: usize,

    /// Average processing time per document (ms)
    pub avg_processing_time_ms: u64,

    /// Total processing time (ms)
    pub total_processing_time_ms: u64,
}

impl BatchReport {
    /// Create a new empty report
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            documents_processed: 0,
            documents_failed: 0,
            documents_skipped: 0,
            documents_written: 0,
            total_entities: 0,
            entities_by_category: BTreeMap::new(),
            entities_by_origin: HashMap::new(),
            samples: Vec::new(),
            warnings: Vec::new(),
            stats: ProcessingStats::default(),
        }
    }

    /// Record a scanned document
    pub fn add_document(
        &mut self,
        path: &Path,
        entities: &[DetectedEntity],
        written: bool,
        processing_time_ms: u64,
    ) {
        self.documents_processed += 1;
        self.stats.total_processing_time_ms += processing_time_ms;
        if written {
            self.documents_written += 1;
        }

        if entities.is_empty() {
            self.stats.documents_without_pii += 1;
        } else {
            self.stats.documents_with_pii += 1;
            self.total_entities += entities.len();

            for entity in entities {
                *self.entities_by_category.entry(entity.category).or_insert(0) += 1;
                *self.entities_by_origin.entry(entity.origin).or_insert(0) += 1;
            }

            let document = display_name(path);
            for entity in entities.iter().take(3) {
                self.add_sample(&document, entity);
            }
        }

        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / self.documents_processed as u64;
    }

    /// Record a document without text
    pub fn add_skipped(&mut self, path: &Path) {
        self.documents_skipped += 1;
        tracing::debug!(file = %display_name(path), "Document has no text");
    }

    /// Record a failed document
    pub fn add_failure(&mut self, path: &Path, error: &impl std::fmt::Display) {
        self.documents_failed += 1;
        self.add_warning(format!("{}: {}", display_name(path), error));
    }

    fn add_sample(&mut self, document: &str, entity: &DetectedEntity) {
        if self.samples.len() >= MAX_SAMPLES {
            return;
        }

        self.samples.push(DetectionSample {
            document: document.to_string(),
            text: truncate(&entity.text, SAMPLE_TEXT_LIMIT),
            category: entity.category,
            origin: entity.origin,
            confidence: entity.confidence,
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Check whether any document failed
    pub fn has_failures(&self) -> bool {
        self.documents_failed > 0
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        if self.dry_run {
            output.push_str("               PSEUDONYMIZATION DRY-RUN REPORT                 \n");
        } else {
            output.push_str("                  PSEUDONYMIZATION REPORT                      \n");
        }
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "  Documents Processed:         {}\n",
            self.documents_processed
        ));
        output.push_str(&format!(
            "  Documents with PII:          {}\n",
            self.stats.documents_with_pii
        ));
        output.push_str(&format!(
            "  Documents without PII:       {}\n",
            self.stats.documents_without_pii
        ));
        output.push_str(&format!(
            "  Documents Skipped (empty):   {}\n",
            self.documents_skipped
        ));
        output.push_str(&format!(
            "  Documents Failed:            {}\n",
            self.documents_failed
        ));
        output.push_str(&format!(
            "  Documents Written:           {}\n",
            self.documents_written
        ));
        output.push_str(&format!(
            "  Total Entities Detected:     {}\n",
            self.total_entities
        ));
        output.push_str(&format!(
            "  Avg Processing Time:         {} ms\n",
            self.stats.avg_processing_time_ms
        ));
        output.push('\n');

        if !self.entities_by_category.is_empty() {
            output.push_str("🔍 DETECTIONS BY CATEGORY\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            let mut categories: Vec<_> = self.entities_by_category.iter().collect();
            categories.sort_by(|a, b| b.1.cmp(a.1));

            for (category, count) in categories {
                output.push_str(&format!("  {:30} {:>5}\n", category.prefix(), count));
            }

            let mut origins: Vec<_> = self.entities_by_origin.iter().collect();
            origins.sort_by_key(|(origin, _)| origin.label());
            for (origin, count) in origins {
                output.push_str(&format!(
                    "  {:30} {:>5}\n",
                    format!("(from {})", origin.label()),
                    count
                ));
            }
            output.push('\n');
        }

        if !self.samples.is_empty() {
            output.push_str("📝 SAMPLE DETECTIONS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            for (i, sample) in self.samples.iter().take(CONSOLE_SAMPLES).enumerate() {
                output.push_str(&format!("\n  Sample #{}\n", i + 1));
                output.push_str(&format!("    Document:    {}\n", sample.document));
                output.push_str(&format!("    Category:    {}\n", sample.category));
                output.push_str(&format!("    Source:      {}\n", sample.origin.label()));
                output.push_str(&format!(
                    "    Confidence:  {:.2}%\n",
                    sample.confidence * 100.0
                ));
                output.push_str(&format!("    Text:        \"{}\"\n", sample.text));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {}\n", warning));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Format the detections of one document as a table
///
/// Columns: category, text (truncated), confidence, detector.
pub fn format_detection_table(path: &Path, entities: &[DetectedEntity]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n🔍 {} ({} entities)\n",
        display_name(path),
        entities.len()
    ));

    if entities.is_empty() {
        output.push_str("  No entities detected\n");
        return output;
    }

    output.push_str(&format!(
        "  {:<16} {:<62} {:>10}  {}\n",
        "Type", "Text", "Confidence", "Source"
    ));
    output.push_str("  ───────────────────────────────────────────────────────────────\n");
    for entity in entities {
        output.push_str(&format!(
            "  {:<16} {:<62} {:>10.2}  {}\n",
            entity.category.prefix(),
            truncate(&entity.text, SAMPLE_TEXT_LIMIT),
            entity.confidence,
            entity.origin.label()
        ));
    }

    output
}

/// Truncate text longer than `limit` chars, marking the cut with "..."
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(category: EntityCategory, text: &str, origin: EntityOrigin) -> DetectedEntity {
        DetectedEntity::new(category, text, 0, text.chars().count(), 0.9, origin)
    }

    #[test]
    fn test_report_creation() {
        let report = BatchReport::new(true);
        assert!(report.dry_run);
        assert_eq!(report.documents_processed, 0);
        assert_eq!(report.total_entities, 0);
        assert!(report.entities_by_category.is_empty());
        assert!(report.samples.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_add_document_without_pii() {
        let mut report = BatchReport::new(false);
        report.add_document(Path::new("vide.txt"), &[], false, 10);

        assert_eq!(report.documents_processed, 1);
        assert_eq!(report.total_entities, 0);
        assert_eq!(report.stats.documents_without_pii, 1);
        assert_eq!(report.stats.documents_with_pii, 0);
        assert_eq!(report.stats.avg_processing_time_ms, 10);
    }

    #[test]
    fn test_add_document_counts_by_category_and_origin() {
        let mut report = BatchReport::new(false);
        let entities = vec![
            entity(EntityCategory::Person, "Jean Dupont", EntityOrigin::Model),
            entity(EntityCategory::Person, "Marie Curie", EntityOrigin::Model),
            entity(
                EntityCategory::RegistrationId,
                "732 829 320 00074",
                EntityOrigin::Pattern,
            ),
        ];

        report.add_document(Path::new("dossier/contrat.txt"), &entities, true, 30);
        report.add_document(Path::new("autre.txt"), &[], false, 10);

        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.documents_written, 1);
        assert_eq!(report.total_entities, 3);
        assert_eq!(
            report.entities_by_category.get(&EntityCategory::Person),
            Some(&2)
        );
        assert_eq!(
            report.entities_by_category.get(&EntityCategory::RegistrationId),
            Some(&1)
        );
        assert_eq!(report.entities_by_origin.get(&EntityOrigin::Model), Some(&2));
        assert_eq!(report.entities_by_origin.get(&EntityOrigin::Pattern), Some(&1));
        assert_eq!(report.samples.len(), 3);
        assert_eq!(report.samples[0].document, "contrat.txt");
        assert_eq!(report.stats.avg_processing_time_ms, 20);
    }

    #[test]
    fn test_samples_are_capped() {
        let mut report = BatchReport::new(false);
        let entities = vec![entity(EntityCategory::Company, "ACME", EntityOrigin::Model); 3];
        for i in 0..10 {
            report.add_document(Path::new(&format!("doc{i}.txt")), &entities, true, 1);
        }

        assert_eq!(report.samples.len(), MAX_SAMPLES);
        assert_eq!(report.total_entities, 30);
    }

    #[test]
    fn test_long_sample_text_is_truncated() {
        let mut report = BatchReport::new(false);
        let long = "a".repeat(80);
        report.add_document(
            Path::new("long.txt"),
            &[entity(EntityCategory::Address, &long, EntityOrigin::Pattern)],
            false,
            1,
        );

        let text = &report.samples[0].text;
        assert_eq!(text.chars().count(), 60);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_failures_become_warnings() {
        let mut report = BatchReport::new(false);
        report.add_failure(Path::new("in/casse.pdf"), &"No reader available for .pdf");

        assert!(report.has_failures());
        assert_eq!(report.documents_failed, 1);
        assert_eq!(report.warnings, vec!["casse.pdf: No reader available for .pdf"]);
    }

    #[test]
    fn test_format_console() {
        let mut report = BatchReport::new(true);
        report.add_document(
            Path::new("a.txt"),
            &[entity(EntityCategory::Person, "Jean Dupont", EntityOrigin::Model)],
            false,
            12,
        );
        report.add_skipped(Path::new("b.txt"));

        let output = report.format_console();
        assert!(output.contains("PSEUDONYMIZATION DRY-RUN REPORT"));
        assert!(output.contains("Documents Processed:         1"));
        assert!(output.contains("Documents Skipped (empty):   1"));
        assert!(output.contains("Total Entities Detected:     1"));
        assert!(output.contains("PERSON"));
        assert!(output.contains("(from model)"));
    }

    #[test]
    fn test_format_json_uses_category_names() {
        let mut report = BatchReport::new(false);
        report.add_document(
            Path::new("a.txt"),
            &[entity(EntityCategory::RegistrationId, "73282932000074", EntityOrigin::Pattern)],
            true,
            1,
        );

        let json: serde_json::Value = serde_json::from_str(&report.format_json().unwrap()).unwrap();
        assert_eq!(json["entities_by_category"]["REGISTRATION_ID"], 1);
        assert_eq!(json["entities_by_origin"]["pattern"], 1);
        assert_eq!(json["documents_written"], 1);
    }

    #[test]
    fn test_detection_table() {
        let entities = vec![
            entity(EntityCategory::Person, "Jean Dupont", EntityOrigin::Model),
            entity(EntityCategory::Address, &"b".repeat(70), EntityOrigin::Pattern),
        ];
        let table = format_detection_table(Path::new("in/contrat.txt"), &entities);

        assert!(table.contains("contrat.txt (2 entities)"));
        assert!(table.contains("Jean Dupont"));
        assert!(table.contains(&format!("{}...", "b".repeat(57))));
        assert!(!table.contains(&"b".repeat(58)));
        assert!(table.contains("pattern"));
    }

    #[test]
    fn test_detection_table_empty() {
        let table = format_detection_table(Path::new("vide.txt"), &[]);
        assert!(table.contains("No entities detected"));
    }
}
