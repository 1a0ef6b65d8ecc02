//! Sliding-window sequence-labeling detector
//!
//! Long texts are cut into overlapping char windows, each window runs through
//! the token-classification model, and the BIO-tagged positions are grouped
//! into spans. Spans are mapped back to global offsets, trimmed of surrounding
//! whitespace, filtered by label and confidence, then deduplicated across
//! windows.
//!
//! The inference runtime is pluggable through [`InferenceBackend`]; see
//! [`model`] for the seams. [`CandleBackend`] runs exported RoBERTa-family
//! checkpoints locally.

pub mod aggregate;
pub mod backend;
pub mod model;
pub mod roberta;
pub mod window;

pub use backend::CandleBackend;
pub use model::{
    InferenceBackend, ModelCache, ModelMetadata, NerModel, SubwordPiece, SubwordTokenizer,
    TokenClassifier,
};
pub use window::WindowConfig;

use super::models::{DetectedEntity, EntityCategory, EntityOrigin};
use super::EntityDetector;
use crate::domain::{CharIndex, Result};
use std::collections::HashSet;

/// Default confidence threshold for model detections
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Default window size in chars
pub const DEFAULT_WINDOW_SIZE: usize = 2000;

/// Default overlap between windows in chars
pub const DEFAULT_WINDOW_OVERLAP: usize = 200;

/// Sequence-labeling entity detector over a loaded model
#[derive(Debug)]
pub struct NerDetector<'m> {
    model: &'m NerModel,
    windows: WindowConfig,
    confidence_threshold: f32,
}

impl<'m> NerDetector<'m> {
    /// Create a detector with default window settings
    pub fn new(model: &'m NerModel) -> Result<Self> {
        Ok(Self {
            model,
            windows: WindowConfig::new(DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_OVERLAP)?,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        })
    }

    /// Override the window configuration
    pub fn with_windows(mut self, windows: WindowConfig) -> Self {
        self.windows = windows;
        self
    }

    /// Override the confidence threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Underlying model
    pub fn model(&self) -> &NerModel {
        self.model
    }
}

impl EntityDetector for NerDetector<'_> {
    fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let index = CharIndex::new(text);
        let text_len = index.char_len();
        let windows = self.windows.windows(text_len);

        let mut entities = Vec::new();
        let mut seen: HashSet<(usize, usize, String)> = HashSet::new();

        for (window_start, window_end) in windows.iter().copied() {
            let window_text = index.slice(window_start, window_end);
            if window_text.trim().is_empty() {
                continue;
            }

            for span in self.model.predict_window(window_text)? {
                let Some(category) = EntityCategory::from_model_label(&span.label) else {
                    continue;
                };
                if span.score < self.confidence_threshold {
                    continue;
                }

                let raw_start = (window_start + span.start).min(text_len);
                let raw_end = (window_start + span.end).min(text_len);
                let Some((start, end)) = trim_span(&index, raw_start, raw_end) else {
                    continue;
                };

                if !seen.insert((start, end, span.label.clone())) {
                    continue;
                }

                entities.push(DetectedEntity::new(
                    category,
                    index.slice(start, end),
                    start,
                    end,
                    span.score,
                    EntityOrigin::Model,
                ));
            }
        }

        tracing::debug!(
            windows = windows.len(),
            count = entities.len(),
            model_id = %self.model.model_id(),
            "Model detection finished"
        );
        Ok(entities)
    }

    fn origin(&self) -> EntityOrigin {
        EntityOrigin::Model
    }
}

/// Shrink a span past leading and trailing whitespace
///
/// Returns `None` when nothing but whitespace remains.
fn trim_span(index: &CharIndex<'_>, start: usize, end: usize) -> Option<(usize, usize)> {
    if start >= end {
        return None;
    }
    let raw = index.slice(start, end);
    let leading = raw.chars().take_while(|c| c.is_whitespace()).count();
    let trailing = raw.chars().rev().take_while(|c| c.is_whitespace()).count();
    let (start, end) = (start + leading, end.saturating_sub(trailing));
    (start < end).then_some((start, end))
}
