//! Pattern library for regex/checksum detection

use super::checksum::luhn_valid;
use super::models::EntityCategory;
use crate::domain::{CaviardeurError, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Compiled-size ceiling for a single pattern; bounded Unicode classes such
/// as `[\w\s]{2,50}` exceed the regex crate's default limit.
const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this entry
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Entity category label
    pub category: String,
    /// Optional post-match validator
    #[serde(default)]
    pub validator: Option<String>,
}

/// Post-match validation applied to a regex hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternValidator {
    /// The ASCII digits of the match must be 14 long and pass the Luhn check
    Luhn,
}

impl PatternValidator {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "luhn" => Some(Self::Luhn),
            _ => None,
        }
    }

    /// Check a matched string
    pub fn accepts(&self, matched: &str) -> bool {
        match self {
            Self::Luhn => {
                let digits: String = matched.chars().filter(char::is_ascii_digit).collect();
                digits.len() == 14 && luhn_valid(&digits)
            }
        }
    }
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Name of the library entry
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
    /// Entity category
    pub category: EntityCategory,
    /// Confidence score
    pub confidence: f32,
    /// Optional validator
    pub validator: Option<PatternValidator>,
}

impl CompiledPattern {
    /// Check whether a regex hit survives validation
    pub fn accepts(&self, matched: &str) -> bool {
        self.validator.map_or(true, |v| v.accepts(matched))
    }
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Pattern registry for regex/checksum detection
#[derive(Debug)]
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_category: HashMap<EntityCategory, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CaviardeurError::Configuration(format!(
                "Failed to read pattern library {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content)?;

        let mut patterns = Vec::new();
        let mut patterns_by_category: HashMap<EntityCategory, Vec<CompiledPattern>> =
            HashMap::new();

        for (name, def) in library.patterns {
            let category = EntityCategory::parse(&def.category).ok_or_else(|| {
                CaviardeurError::Configuration(format!(
                    "Invalid category in pattern '{}': {}",
                    name, def.category
                ))
            })?;

            let validator = match def.validator.as_deref() {
                Some(v) => Some(PatternValidator::parse(v).ok_or_else(|| {
                    CaviardeurError::Configuration(format!(
                        "Unknown validator in pattern '{name}': {v}"
                    ))
                })?),
                None => None,
            };

            if !(0.0..=1.0).contains(&def.confidence) {
                return Err(CaviardeurError::Configuration(format!(
                    "Confidence of pattern '{}' must be within [0, 1], got {}",
                    name, def.confidence
                )));
            }

            for pattern_str in &def.patterns {
                let regex = RegexBuilder::new(pattern_str)
                    .size_limit(PATTERN_SIZE_LIMIT)
                    .build()
                    .map_err(|e| {
                        CaviardeurError::Configuration(format!(
                            "Invalid regex in pattern '{name}': {e}"
                        ))
                    })?;

                let compiled = CompiledPattern {
                    name: name.clone(),
                    regex,
                    category,
                    confidence: def.confidence,
                    validator,
                };

                patterns.push(compiled.clone());
                patterns_by_category
                    .entry(category)
                    .or_default()
                    .push(compiled);
            }
        }

        Ok(Self {
            patterns,
            patterns_by_category,
        })
    }

    /// Create a default pattern registry with built-in patterns
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../patterns/fr_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific category
    pub fn patterns_for_category(&self, category: EntityCategory) -> Option<&[CompiledPattern]> {
        self.patterns_by_category
            .get(&category)
            .map(|v| v.as_slice())
    }
}
