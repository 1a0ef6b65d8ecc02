//! Character-offset helpers
//!
//! Entity spans and fragment offsets are counted in Unicode scalar values,
//! while Rust string slicing and regex matches work in bytes. [`CharIndex`]
//! translates between the two for one piece of text.

/// Char-to-byte lookup table for a borrowed string
#[derive(Debug, Clone)]
pub struct CharIndex<'a> {
    text: &'a str,
    /// Byte offset of every char, plus a trailing `text.len()` sentinel
    byte_offsets: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    /// Build the table for `text`
    pub fn new(text: &'a str) -> Self {
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_offsets.push(text.len());
        Self { text, byte_offsets }
    }

    /// The indexed text
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Number of chars in the text
    pub fn char_len(&self) -> usize {
        self.byte_offsets.len() - 1
    }

    /// Byte offset of the char at `char_idx`, clamped to the end of the text
    pub fn byte_offset(&self, char_idx: usize) -> usize {
        let idx = char_idx.min(self.char_len());
        self.byte_offsets[idx]
    }

    /// Char offset of a byte position that sits on a char boundary
    ///
    /// Positions inside a multi-byte char resolve to the following char.
    pub fn char_offset(&self, byte_idx: usize) -> usize {
        match self.byte_offsets.binary_search(&byte_idx) {
            Ok(i) => i,
            Err(i) => i.min(self.char_len()),
        }
    }

    /// Slice the text by char range `[start, end)`, clamped to the text
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let start = self.byte_offset(start);
        let end = self.byte_offset(end).max(start);
        &self.text[start..end]
    }
}

/// Length of `text` in chars
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Replace the char range `[start, end)` of `buffer` with `replacement`
///
/// Out-of-range bounds are clamped to the buffer so a stale range never panics.
pub fn replace_char_range(buffer: &mut String, start: usize, end: usize, replacement: &str) {
    let index = CharIndex::new(buffer);
    let byte_start = index.byte_offset(start);
    let byte_end = index.byte_offset(end).max(byte_start);
    buffer.replace_range(byte_start..byte_end, replacement);
}
