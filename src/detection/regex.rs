//! Regex/checksum entity detector

use super::{
    models::{DetectedEntity, EntityCategory, EntityOrigin},
    patterns::{CompiledPattern, PatternRegistry},
    EntityDetector,
};
use crate::domain::{CharIndex, Result};
use std::sync::Arc;

/// Regex-based entity detector
///
/// Emits every validated match of every pattern. Matches of different
/// patterns may overlap; the overlap resolver sorts that out downstream.
#[derive(Debug, Clone)]
pub struct RegexDetector {
    pattern_registry: Arc<PatternRegistry>,
}

impl RegexDetector {
    /// Create a new regex detector with default patterns
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self::with_registry(registry))
    }

    /// Create a new regex detector with custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            pattern_registry: Arc::new(registry),
        }
    }

    /// Detect entities of a single category
    pub fn detect_category(&self, text: &str, category: EntityCategory) -> Vec<DetectedEntity> {
        let index = CharIndex::new(text);
        self.pattern_registry
            .patterns_for_category(category)
            .unwrap_or_default()
            .iter()
            .flat_map(|pattern| Self::scan(pattern, &index))
            .collect()
    }

    /// Run one pattern over the text
    fn scan(pattern: &CompiledPattern, index: &CharIndex<'_>) -> Vec<DetectedEntity> {
        let mut entities = Vec::new();

        for matched in pattern.regex.find_iter(index.text()) {
            if matched.is_empty() || !pattern.accepts(matched.as_str()) {
                continue;
            }

            let start = index.char_offset(matched.start());
            let end = index.char_offset(matched.end());
            entities.push(DetectedEntity::new(
                pattern.category,
                matched.as_str(),
                start,
                end,
                pattern.confidence,
                EntityOrigin::Pattern,
            ));
        }

        entities
    }
}

impl EntityDetector for RegexDetector {
    fn detect(&self, text: &str) -> Result<Vec<DetectedEntity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let index = CharIndex::new(text);
        let entities: Vec<DetectedEntity> = self
            .pattern_registry
            .all_patterns()
            .iter()
            .flat_map(|pattern| Self::scan(pattern, &index))
            .collect();

        tracing::debug!(count = entities.len(), "Pattern detection finished");
        Ok(entities)
    }

    fn origin(&self) -> EntityOrigin {
        EntityOrigin::Pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration_ids(text: &str) -> Vec<DetectedEntity> {
        RegexDetector::new()
            .unwrap()
            .detect_category(text, EntityCategory::RegistrationId)
    }

    fn addresses(text: &str) -> Vec<DetectedEntity> {
        RegexDetector::new()
            .unwrap()
            .detect_category(text, EntityCategory::Address)
    }

    #[test]
    fn test_detect_siret_without_spaces() {
        let entities = registration_ids("Le SIRET est 73282932000074 pour cette entreprise.");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].category, EntityCategory::RegistrationId);
        assert_eq!(entities[0].text, "73282932000074");
        assert_eq!(entities[0].start, 13);
        assert_eq!(entities[0].end, 27);
        assert_eq!(entities[0].confidence, 0.95);
        assert_eq!(entities[0].origin, EntityOrigin::Pattern);
    }

    #[test]
    fn test_detect_siret_with_spaces() {
        let entities = registration_ids("SIRET: 732 829 320 00074");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "732 829 320 00074");
        assert_eq!(entities[0].start, 7);
        assert_eq!(entities[0].end, 24);
    }

    #[test]
    fn test_detect_siret_invalid_checksum() {
        assert!(registration_ids("SIRET: 12345678901234").is_empty());
    }

    #[test]
    fn test_detect_siret_wrong_length() {
        assert!(registration_ids("Numéro: 1234567890").is_empty());
        assert!(registration_ids("Numéro: 7328293200007412").is_empty());
    }

    #[test]
    fn test_detect_siret_offsets_after_accents() {
        let text = "Société générale: 732 829 320 00074";
        let entities = registration_ids(text);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].start, 18);
        assert_eq!(
            CharIndex::new(text).slice(entities[0].start, entities[0].end),
            "732 829 320 00074"
        );
    }

    #[test]
    fn test_detect_address_simple() {
        let entities = addresses("Adresse: 12 rue de la Paix, 75002 Paris");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].category, EntityCategory::Address);
        assert_eq!(entities[0].confidence, 0.75);
        assert!(entities[0].text.contains("rue de la Paix"));
        assert!(entities[0].text.ends_with("75002 Paris"));
    }

    #[test]
    fn test_detect_address_boulevard() {
        let entities = addresses("Siège: 45 boulevard Haussmann, 75009 Paris");
        assert_eq!(entities.len(), 1);
        assert!(entities[0].text.contains("boulevard Haussmann"));
    }

    #[test]
    fn test_detect_address_avenue_with_accents() {
        let entities = addresses("Bureau: 8 avenue des Champs-Élysées");
        assert_eq!(entities.len(), 1);
        assert!(entities[0].text.contains("avenue des Champs"));
        assert_eq!(entities[0].start, 8);
    }

    #[test]
    fn test_detect_address_case_insensitive() {
        let entities = addresses("12 RUE DE LA PAIX");
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_detect_address_no_match() {
        assert!(addresses("Ceci est un texte sans adresse.").is_empty());
    }

    #[test]
    fn test_detect_runs_all_patterns() {
        let detector = RegexDetector::new().unwrap();
        let entities = detector
            .detect("SIRET 73282932000074, siège au 12 rue de la Paix, 75002 Paris")
            .unwrap();

        assert!(entities
            .iter()
            .any(|e| e.category == EntityCategory::RegistrationId));
        assert!(entities.iter().any(|e| e.category == EntityCategory::Address));
    }

    #[test]
    fn test_detect_blank_input() {
        let detector = RegexDetector::new().unwrap();
        assert!(detector.detect("").unwrap().is_empty());
        assert!(detector.detect("  \n\t ").unwrap().is_empty());
    }
}
