//! Entity data models

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Closed set of personal-data categories handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    /// Person names
    Person,
    /// Company and organisation names
    Company,
    /// Postal addresses
    Address,
    /// Business registration numbers (SIRET)
    RegistrationId,
}

impl EntityCategory {
    /// Every category, in pseudonym-prefix order
    pub const ALL: [EntityCategory; 4] = [
        Self::Person,
        Self::Company,
        Self::Address,
        Self::RegistrationId,
    ];

    /// Pseudonym prefix for the category
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Company => "COMPANY",
            Self::Address => "ADDRESS",
            Self::RegistrationId => "REGISTRATION_ID",
        }
    }

    /// Tie-break rank used when overlapping detections have equal confidence and length
    pub fn specificity(&self) -> u8 {
        match self {
            Self::RegistrationId => 3,
            Self::Address => 2,
            Self::Person | Self::Company => 1,
        }
    }

    /// Parse a pseudonym prefix back into its category
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.prefix() == prefix)
    }

    /// Map a model entity label (the part after `B-`/`I-`) to a category
    ///
    /// Only person, organisation and location labels are kept; anything
    /// else the model emits (dates, misc) is ignored.
    pub fn from_model_label(label: &str) -> Option<Self> {
        match label {
            "PER" => Some(Self::Person),
            "ORG" => Some(Self::Company),
            "LOC" => Some(Self::Address),
            _ => None,
        }
    }

    /// Parse a category name as written in pattern libraries
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PERSON" | "PER" => Some(Self::Person),
            "COMPANY" | "ORG" => Some(Self::Company),
            "ADDRESS" | "LOC" => Some(Self::Address),
            "REGISTRATION_ID" | "SIRET" => Some(Self::RegistrationId),
            _ => None,
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Which detector produced an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOrigin {
    /// Sequence-labeling model
    Model,
    /// Regex/checksum pattern
    Pattern,
}

impl EntityOrigin {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Pattern => "pattern",
        }
    }
}

/// A detected personal-data span in the flattened document text
///
/// `start`/`end` are half-open char offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    /// Category of the entity
    pub category: EntityCategory,
    /// Matched text, exactly as it appears in the document
    pub text: String,
    /// First char offset
    pub start: usize,
    /// One past the last char offset
    pub end: usize,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Detector that produced the entity
    pub origin: EntityOrigin,
}

impl DetectedEntity {
    /// Create a new entity
    pub fn new(
        category: EntityCategory,
        text: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f32,
        origin: EntityOrigin,
    ) -> Self {
        debug_assert!(start < end, "entity span must be non-empty");
        Self {
            category,
            text: text.into(),
            start,
            end,
            confidence,
            origin,
        }
    }

    /// Span length in chars
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check whether the span is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether two spans share at least one char
    pub fn overlaps(&self, other: &DetectedEntity) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Compare by `(confidence, span length, specificity)` lexicographically
    pub fn rank_cmp(&self, other: &DetectedEntity) -> Ordering {
        self.confidence
            .total_cmp(&other.confidence)
            .then_with(|| self.len().cmp(&other.len()))
            .then_with(|| {
                self.category
                    .specificity()
                    .cmp(&other.category.specificity())
            })
    }

    /// Check whether this entity strictly outranks `other`
    pub fn outranks(&self, other: &DetectedEntity) -> bool {
        self.rank_cmp(other) == Ordering::Greater
    }
}
