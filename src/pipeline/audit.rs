//! Audit logger for pseudonymization runs
//!
//! One append-only entry per pseudonymized document. Detected text is only
//! ever recorded as a SHA-256 hash salted with a random per-run secret, so
//! hashes match within a run and cannot be compared across runs or against
//! a dictionary of names.

use crate::detection::DetectedEntity;
use crate::domain::{CaviardeurError, Result};
use crate::pseudonymizer::MappingStore;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: String,
    document: String,
    output: String,
    entity_count: usize,
    processing_time_ms: u64,
    entities: Vec<AuditEntity>,
}

/// Audit entity entry (with hashed text)
#[derive(Debug, Serialize)]
struct AuditEntity {
    category: String,
    start: usize,
    end: usize,
    confidence: f32,
    origin: String,
    pseudonym: Option<String>,
    /// Salted SHA-256 hash of the detected text
    value_hash: String,
}

/// Audit logger for pseudonymization runs
#[derive(Debug)]
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
    run_id: Uuid,
    /// Never written out
    salt: [u8; 16],
}

impl AuditLogger {
    /// Create a new audit logger
    ///
    /// Every entry written through this logger carries the same run id.
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CaviardeurError::Io(format!(
                        "Failed to create audit log directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
            run_id: Uuid::new_v4(),
            salt: Uuid::new_v4().into_bytes(),
        })
    }

    /// Run identifier shared by this logger's entries
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Log a pseudonymized document
    ///
    /// Pseudonyms are looked up in `mapping`, so call this after the
    /// document has been pseudonymized.
    pub fn log_document(
        &self,
        source: &Path,
        output: &Path,
        entities: &[DetectedEntity],
        mapping: &MappingStore,
        processing_time_ms: u64,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: self.run_id.to_string(),
            document: source.display().to_string(),
            output: output.display().to_string(),
            entity_count: entities.len(),
            processing_time_ms,
            entities: entities
                .iter()
                .map(|entity| AuditEntity {
                    category: entity.category.prefix().to_string(),
                    start: entity.start,
                    end: entity.end,
                    confidence: entity.confidence,
                    origin: entity.origin.label().to_string(),
                    pseudonym: mapping
                        .get_existing_pseudonym(&entity.text, entity.category)
                        .map(str::to_string),
                    value_hash: hash_value(&self.salt, &entity.text),
                })
                .collect(),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                CaviardeurError::Io(format!(
                    "Failed to open audit log {}: {}",
                    self.log_path.display(),
                    e
                ))
            })?;

        if self.json_format {
            let json_line = serde_json::to_string(entry)?;
            writeln!(file, "{json_line}")?;
        } else {
            writeln!(
                file,
                "[{}] Run: {} | Document: {} | Output: {} | Entities: {} | Time: {}ms",
                entry.timestamp,
                entry.run_id,
                entry.document,
                entry.output,
                entry.entity_count,
                entry.processing_time_ms
            )?;
        }

        Ok(())
    }
}

/// Hash a detected value with SHA-256 over `salt || value`
fn hash_value(salt: &[u8], value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}
