//! Format registry
//!
//! Maps file extensions to readers and writers. Plain-text formats are
//! bundled. Office and PDF formats are part of the contract but ship no
//! adapter; register one with [`FormatRegistry::register`] to enable them.
//! Legacy binary Office formats are always rejected with a conversion hint.

use super::text::{PlainTextReader, PlainTextWriter};
use super::traits::{DocumentReader, DocumentWriter};
use crate::domain::{CaviardeurError, Document, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions handled by the bundled plain-text adapter
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "json", "xml"];

/// Extensions accepted without a bundled adapter
pub const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "xlsx", "xls", "pdf", "pptx"];

/// Legacy extensions and the conversion hint shown for them
pub const LEGACY_EXTENSIONS: &[(&str, &str)] = &[
    (
        "doc",
        "Legacy .doc format is not supported. Please convert to .docx first \
         (e.g. libreoffice --headless --convert-to docx file.doc)",
    ),
    (
        "ppt",
        "Legacy .ppt format is not supported. Please convert to .pptx first \
         (e.g. libreoffice --headless --convert-to pptx file.ppt)",
    ),
];

/// Lowercased extension of a path
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

fn legacy_hint(ext: &str) -> Option<&'static str> {
    LEGACY_EXTENSIONS
        .iter()
        .find(|(legacy, _)| *legacy == ext)
        .map(|(_, hint)| *hint)
}

/// Check whether a file is picked up for processing
///
/// Legacy formats count, so the user sees the conversion hint.
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| {
        PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str())
            || DOCUMENT_EXTENSIONS.contains(&ext.as_str())
            || legacy_hint(&ext).is_some()
    })
}

/// List the files to process under `path`
///
/// A supported file yields itself; a directory yields its supported files,
/// non-recursively, sorted by path.
pub fn list_supported_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(if is_supported(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    if !path.is_dir() {
        return Err(CaviardeurError::Document(format!(
            "Input path does not exist: {}",
            path.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() && is_supported(&entry_path) {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output location for a processed document
///
/// Keeps the input file name, except legacy spreadsheets which are written
/// in the modern format.
pub fn output_path(input: &Path, document: &Document, output_dir: &Path) -> PathBuf {
    let name = match (document.format(), input.file_stem()) {
        (Some("xls"), Some(stem)) => format!("{}.xlsx", stem.to_string_lossy()),
        _ => input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    output_dir.join(name)
}

/// Extension to adapter table
#[derive(Clone, Default)]
pub struct FormatRegistry {
    readers: HashMap<String, Arc<dyn DocumentReader>>,
    writers: HashMap<String, Arc<dyn DocumentWriter>>,
}

impl FormatRegistry {
    /// Registry with the bundled plain-text adapter
    pub fn new() -> Self {
        let mut registry = Self::default();
        let reader: Arc<dyn DocumentReader> = Arc::new(PlainTextReader);
        let writer: Arc<dyn DocumentWriter> = Arc::new(PlainTextWriter);
        for ext in PLAIN_TEXT_EXTENSIONS {
            registry.register(ext, Arc::clone(&reader), Arc::clone(&writer));
        }
        registry
    }

    /// Register an adapter pair for an extension (without the dot)
    pub fn register(
        &mut self,
        ext: &str,
        reader: Arc<dyn DocumentReader>,
        writer: Arc<dyn DocumentWriter>,
    ) {
        let ext = ext.to_lowercase();
        self.readers.insert(ext.clone(), reader);
        self.writers.insert(ext, writer);
    }

    /// Check whether an extension has a reader
    pub fn has_reader(&self, ext: &str) -> bool {
        self.readers.contains_key(&ext.to_lowercase())
    }

    /// Read a document with the adapter for its extension
    pub fn read(&self, path: &Path) -> Result<Document> {
        let ext = extension(path).unwrap_or_default();

        if let Some(hint) = legacy_hint(&ext) {
            return Err(CaviardeurError::UnsupportedFormat(format!(
                "{}: {}",
                path.display(),
                hint
            )));
        }

        let reader = self.readers.get(&ext).ok_or_else(|| {
            CaviardeurError::UnsupportedFormat(format!(
                "No reader available for .{} ({})",
                ext,
                path.display()
            ))
        })?;

        tracing::debug!(path = %path.display(), format = %ext, "Reading document");
        reader.read(path)
    }

    /// Write a document with the adapter for the output extension
    pub fn write(&self, document: &Document, output_path: &Path) -> Result<()> {
        let ext = extension(output_path).unwrap_or_default();
        let writer = self.writers.get(&ext).ok_or_else(|| {
            CaviardeurError::UnsupportedFormat(format!(
                "No writer available for .{} ({})",
                ext,
                output_path.display()
            ))
        })?;

        writer.write(document, output_path)
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<&String> = self.readers.keys().collect();
        formats.sort();
        f.debug_struct("FormatRegistry")
            .field("formats", &formats)
            .finish()
    }
}
