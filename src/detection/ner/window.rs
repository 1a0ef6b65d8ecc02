//! Sliding windows and model input encoding

use super::model::SubwordPiece;
use crate::domain::{CaviardeurError, Result};

/// Special token ids as the model expects them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    /// Model begin-of-sequence id
    pub bos_id: i64,
    /// Model end-of-sequence id
    pub eos_id: i64,
    /// Added to every ordinary piece id
    pub vocab_offset: i64,
}

/// Window partitioning of a text, in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    window_size: usize,
    window_overlap: usize,
}

impl WindowConfig {
    /// Create a window configuration; `window_overlap` must be below `window_size`
    pub fn new(window_size: usize, window_overlap: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(CaviardeurError::Validation(
                "Window size must be greater than 0".to_string(),
            ));
        }
        if window_overlap >= window_size {
            return Err(CaviardeurError::Validation(format!(
                "Window overlap ({window_overlap}) must be smaller than window size ({window_size})"
            )));
        }
        Ok(Self {
            window_size,
            window_overlap,
        })
    }

    /// Window size in chars
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Overlap between consecutive windows in chars
    pub fn window_overlap(&self) -> usize {
        self.window_overlap
    }

    /// Distance between consecutive window starts
    pub fn step(&self) -> usize {
        self.window_size - self.window_overlap
    }

    /// Half-open `(start, end)` char ranges covering a text of `text_len` chars
    ///
    /// An empty text still yields the single window `(0, 0)`.
    pub fn windows(&self, text_len: usize) -> Vec<(usize, usize)> {
        let windows: Vec<(usize, usize)> = (0..text_len)
            .step_by(self.step())
            .map(|start| (start, (start + self.window_size).min(text_len)))
            .collect();

        if windows.is_empty() {
            vec![(0, 0)]
        } else {
            windows
        }
    }
}

/// Model input for one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWindow {
    /// Input ids, BOS first and EOS last
    pub input_ids: Vec<i64>,
    /// Window-relative char offsets per position; `(0, 0)` for special tokens
    pub offsets: Vec<(usize, usize)>,
    /// Whether each position is a special token
    pub special: Vec<bool>,
}

impl EncodedWindow {
    /// Number of positions
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Check whether the encoding has no positions
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// All-ones attention mask of matching length
    pub fn attention_mask(&self) -> Vec<i64> {
        vec![1; self.input_ids.len()]
    }
}

/// Build the model input for a tokenized window
///
/// Piece ids are shifted by the vocabulary offset and framed by BOS/EOS. When
/// the result exceeds `max_len`, it is cut to `max_len - 1` positions and the
/// model EOS appended, so the sequence always ends with EOS.
pub fn encode_window(pieces: &[SubwordPiece], special: &SpecialTokens, max_len: usize) -> EncodedWindow {
    let max_len = max_len.max(2);
    let total = pieces.len() + 2;
    let kept = pieces.len().min(max_len - 2);

    let mut input_ids = Vec::with_capacity(total.min(max_len));
    let mut offsets = Vec::with_capacity(total.min(max_len));
    let mut flags = Vec::with_capacity(total.min(max_len));

    input_ids.push(special.bos_id);
    offsets.push((0, 0));
    flags.push(true);

    for piece in &pieces[..kept] {
        input_ids.push(piece.id + special.vocab_offset);
        offsets.push((piece.begin, piece.end));
        flags.push(false);
    }

    input_ids.push(special.eos_id);
    offsets.push((0, 0));
    flags.push(true);

    if total > max_len {
        tracing::debug!(
            positions = total,
            max_len,
            "Window encoding truncated to the model's maximum length"
        );
    }

    EncodedWindow {
        input_ids,
        offsets,
        special: flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SPECIAL: SpecialTokens = SpecialTokens {
        bos_id: 5,
        eos_id: 6,
        vocab_offset: 4,
    };

    fn pieces(n: usize) -> Vec<SubwordPiece> {
        (0..n)
            .map(|i| SubwordPiece {
                id: 10 + i as i64,
                begin: i * 2,
                end: i * 2 + 1,
            })
            .collect()
    }

    #[test_case(2000, 200, 4500 => vec![(0, 2000), (1800, 3800), (3600, 4500)] ; "default sizes")]
    #[test_case(10, 0, 25 => vec![(0, 10), (10, 20), (20, 25)] ; "no overlap")]
    #[test_case(10, 2, 5 => vec![(0, 5)] ; "shorter than a window")]
    #[test_case(10, 2, 0 => vec![(0, 0)] ; "empty text")]
    fn test_windows(size: usize, overlap: usize, len: usize) -> Vec<(usize, usize)> {
        WindowConfig::new(size, overlap).unwrap().windows(len)
    }

    #[test]
    fn test_window_config_rejects_overlap_not_below_size() {
        assert!(WindowConfig::new(100, 100).is_err());
        assert!(WindowConfig::new(100, 150).is_err());
        assert!(WindowConfig::new(0, 0).is_err());
        assert_eq!(WindowConfig::new(100, 99).unwrap().step(), 1);
    }

    #[test]
    fn test_encode_applies_vocab_offset_and_framing() {
        let encoded = encode_window(&pieces(3), &SPECIAL, 512);
        assert_eq!(encoded.input_ids, vec![5, 14, 15, 16, 6]);
        assert_eq!(encoded.special, vec![true, false, false, false, true]);
        assert_eq!(encoded.offsets[0], (0, 0));
        assert_eq!(encoded.offsets[2], (2, 3));
        assert_eq!(encoded.attention_mask(), vec![1; 5]);
    }

    #[test]
    fn test_encode_truncates_and_keeps_eos() {
        let encoded = encode_window(&pieces(10), &SPECIAL, 6);
        assert_eq!(encoded.len(), 6);
        assert_eq!(encoded.input_ids, vec![5, 14, 15, 16, 17, 6]);
        assert_eq!(encoded.input_ids.last(), Some(&SPECIAL.eos_id));
        assert_eq!(encoded.special.last(), Some(&true));
    }

    #[test]
    fn test_encode_exact_fit_is_not_truncated() {
        let encoded = encode_window(&pieces(4), &SPECIAL, 6);
        assert_eq!(encoded.input_ids, vec![5, 14, 15, 16, 17, 6]);
    }

    #[test]
    fn test_encode_empty_window() {
        let encoded = encode_window(&[], &SPECIAL, 512);
        assert_eq!(encoded.input_ids, vec![5, 6]);
    }
}
