//! Per-token predictions and BIO span aggregation

use super::model::{BioTag, LabelTable};
use super::window::EncodedWindow;

/// Winning label of one position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPrediction {
    /// Label id with the highest probability
    pub label_id: usize,
    /// Its softmax probability
    pub score: f32,
}

/// An aggregated span, before category mapping and thresholding
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpan {
    /// Entity type, the tag without its `B-`/`I-` prefix
    pub label: String,
    /// First char, relative to the window
    pub start: usize,
    /// One past the last char, relative to the window
    pub end: usize,
    /// Mean score of the member positions
    pub score: f32,
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax then argmax; the first maximum wins ties
///
/// Returns `None` for an empty row.
pub fn predict(logits: &[f32]) -> Option<TokenPrediction> {
    let probs = softmax(logits);
    let mut best: Option<TokenPrediction> = None;
    for (label_id, &score) in probs.iter().enumerate() {
        if best.map_or(true, |b| score > b.score) {
            best = Some(TokenPrediction { label_id, score });
        }
    }
    best
}

struct OpenSpan {
    label: String,
    start: usize,
    end: usize,
    score_sum: f32,
    members: usize,
}

impl OpenSpan {
    fn new(label: &str, (start, end): (usize, usize), score: f32) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
            score_sum: score,
            members: 1,
        }
    }

    fn extend(&mut self, end: usize, score: f32) {
        self.end = end;
        self.score_sum += score;
        self.members += 1;
    }

    fn close(self) -> RawSpan {
        RawSpan {
            label: self.label,
            start: self.start,
            end: self.end,
            score: self.score_sum / self.members as f32,
        }
    }
}

/// Group BIO-tagged positions into spans
///
/// Special positions and `O` close the open span. `B-X` closes it
/// and opens a new `X` span. `I-X` extends an open `X` span, otherwise it
/// closes whatever is open and starts a new `X` span. A span still open at
/// the end is closed.
pub fn aggregate_bio(
    encoded: &EncodedWindow,
    predictions: &[TokenPrediction],
    labels: &LabelTable,
) -> Vec<RawSpan> {
    let mut spans = Vec::new();
    let mut current: Option<OpenSpan> = None;

    let positions = encoded
        .offsets
        .iter()
        .zip(&encoded.special)
        .zip(predictions);

    for ((&offsets, &is_special), prediction) in positions {
        if is_special {
            if let Some(span) = current.take() {
                spans.push(span.close());
            }
            continue;
        }

        match labels.tag(prediction.label_id) {
            BioTag::Outside => {
                if let Some(span) = current.take() {
                    spans.push(span.close());
                }
            }
            BioTag::Begin(kind) => {
                if let Some(span) = current.take() {
                    spans.push(span.close());
                }
                current = Some(OpenSpan::new(kind, offsets, prediction.score));
            }
            BioTag::Inside(kind) => match current.as_mut() {
                Some(span) if span.label == *kind => span.extend(offsets.1, prediction.score),
                _ => {
                    if let Some(span) = current.take() {
                        spans.push(span.close());
                    }
                    current = Some(OpenSpan::new(kind, offsets, prediction.score));
                }
            },
            BioTag::Other => {}
        }
    }

    if let Some(span) = current {
        spans.push(span.close());
    }

    spans
}
