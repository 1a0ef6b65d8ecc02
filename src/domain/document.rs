//! Document and fragment types
//!
//! A [`Document`] is the ordered fragment sequence produced by a format reader.
//! The flattened document text is the concatenation of fragment texts; each
//! fragment records where its first char lands in that flattened text.
//!
//! The core never interprets a fragment's `location` or the document
//! `metadata`; they are carried through so the writer can rebuild the file.

use super::text::char_len;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the original format (e.g. `"txt"`, `"xls"`)
pub const METADATA_FORMAT: &str = "format";

/// Metadata key holding the path the document was read from
pub const METADATA_SOURCE_PATH: &str = "source_path";

/// A contiguous piece of extracted text with its structural location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Fragment text
    pub text: String,
    /// Char offset of the first char in the flattened document text
    #[serde(default)]
    pub offset: usize,
    /// Opaque, format-specific location token
    #[serde(default)]
    pub location: Value,
}

impl TextFragment {
    /// Create a fragment; the offset is assigned by the owning [`Document`]
    pub fn new(text: impl Into<String>, location: Value) -> Self {
        Self {
            text: text.into(),
            offset: 0,
            location,
        }
    }

    /// Length of the fragment text in chars
    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    /// Char range `[offset, offset + len)` covered in the flattened text
    pub fn span(&self) -> (usize, usize) {
        (self.offset, self.offset + self.char_len())
    }
}

/// Ordered fragments plus opaque metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Fragments in reading order
    pub fragments: Vec<TextFragment>,
    /// Pass-through metadata for the writer
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Create a document and compute fragment offsets
    pub fn new(fragments: Vec<TextFragment>, metadata: Map<String, Value>) -> Self {
        let mut document = Self {
            fragments,
            metadata,
        };
        document.assign_offsets();
        document
    }

    /// Recompute every fragment offset as the running prefix length
    pub fn assign_offsets(&mut self) {
        let mut offset = 0;
        for fragment in &mut self.fragments {
            fragment.offset = offset;
            offset += fragment.char_len();
        }
    }

    /// Concatenation of all fragment texts
    pub fn flattened_text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Check whether the document has no non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.fragments.iter().all(|f| f.text.trim().is_empty())
    }

    /// Format hint set by the reader
    pub fn format(&self) -> Option<&str> {
        self.metadata.get(METADATA_FORMAT).and_then(Value::as_str)
    }

    /// Source path set by the reader
    pub fn source_path(&self) -> Option<&str> {
        self.metadata.get(METADATA_SOURCE_PATH).and_then(Value::as_str)
    }
}
