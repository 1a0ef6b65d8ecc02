//! Plain-text reader and writer (`.txt`, `.md`, `.json`, `.xml`)

use super::traits::{DocumentReader, DocumentWriter};
use crate::domain::document::{METADATA_FORMAT, METADATA_SOURCE_PATH};
use crate::domain::{CaviardeurError, Document, Result, TextFragment};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Reads a text file as a single fragment
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl PlainTextReader {
    /// Decode bytes as UTF-8, falling back to Latin-1
    fn decode(bytes: Vec<u8>, path: &Path) -> String {
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    file = %file_name(path),
                    "Not valid UTF-8, falling back to Latin-1 encoding"
                );
                err.into_bytes().into_iter().map(char::from).collect()
            }
        }
    }
}

impl DocumentReader for PlainTextReader {
    fn read(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).map_err(|e| {
            CaviardeurError::Document(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let text = Self::decode(bytes, path);

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "txt".to_string());

        let mut metadata = Map::new();
        metadata.insert(
            METADATA_SOURCE_PATH.to_string(),
            Value::String(path.display().to_string()),
        );
        metadata.insert(METADATA_FORMAT.to_string(), Value::String(format));

        Ok(Document::new(
            vec![TextFragment::new(text, json!({"type": "txt"}))],
            metadata,
        ))
    }
}

/// Writes the concatenated fragments as UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextWriter;

impl DocumentWriter for PlainTextWriter {
    fn write(&self, document: &Document, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, document.flattened_text()).map_err(|e| {
            CaviardeurError::Document(format!(
                "Failed to write {}: {}",
                output_path.display(),
                e
            ))
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
