//! Personal-data detection
//!
//! Provides a trait-based detection interface with two implementations:
//! [`RegexDetector`] for checksum-validated regex patterns and
//! [`NerDetector`] for the sliding-window sequence-labeling model. Their
//! outputs are merged by [`detect_all`] and reconciled by
//! [`resolve_overlaps`].

pub mod checksum;
pub mod models;
pub mod ner;
pub mod patterns;
pub mod regex;
pub mod resolver;

pub use models::{DetectedEntity, EntityCategory, EntityOrigin};
pub use ner::NerDetector;
pub use patterns::PatternRegistry;
pub use regex::RegexDetector;
pub use resolver::resolve_overlaps;

use crate::domain::Result;

/// Trait for entity detection implementations
pub trait EntityDetector {
    /// Detect entities in a text; offsets are chars into `text`
    fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>>;

    /// Which detector family produces the entities
    fn origin(&self) -> EntityOrigin;
}

/// Run every available detector over `text` and resolve overlaps
///
/// Model detections come first, then pattern detections; the resolver's
/// stable ordering depends on this. Without a model, only patterns run.
pub fn detect_all(
    text: &str,
    patterns: &RegexDetector,
    model: Option<&NerDetector<'_>>,
) -> Result<Vec<DetectedEntity>> {
    let mut entities = match model {
        Some(detector) => detector.detect(text)?,
        None => Vec::new(),
    };
    let model_count = entities.len();

    entities.extend(patterns.detect(text)?);
    let candidates = entities.len();

    let resolved = resolve_overlaps(entities);
    tracing::debug!(
        model = model_count,
        pattern = candidates - model_count,
        resolved = resolved.len(),
        "Detection finished"
    );
    Ok(resolved)
}
