//! Pseudonym mapping store
//!
//! Bidirectional registry between pseudonyms (`PERSON_001`) and the original
//! texts they stand for. Lookups by text are normalized: whitespace runs
//! collapse to one space, the ends are trimmed, and case is ignored. The
//! stored original keeps its first-seen spelling.
//!
//! The store persists as a flat JSON object `{pseudonym: original}` written
//! with owner-only permissions.

use crate::detection::EntityCategory;
use crate::domain::{CaviardeurError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use zeroize::Zeroize;

/// Matches any well-formed pseudonym token
const PSEUDONYM_PATTERN: &str = r"\b(?:PERSON|COMPANY|ADDRESS|REGISTRATION_ID)_\d{3,}\b";

/// One pseudonym assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PseudonymRecord {
    /// Pseudonym token, e.g. `PERSON_003`
    pub pseudonym: String,
    /// Original text as first seen
    pub original_text: String,
    /// Category of the entity
    pub category: EntityCategory,
    /// Per-category sequence number, from 1
    pub sequence_number: u64,
}

/// Collapse whitespace runs and trim
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a pseudonym from its category and sequence number
pub fn format_pseudonym(category: EntityCategory, sequence_number: u64) -> String {
    format!("{}_{:03}", category.prefix(), sequence_number)
}

/// Split a pseudonym into category and sequence number
///
/// Returns `None` for unknown prefixes, non-numeric suffixes and suffixes
/// too large for a `u64`.
pub fn parse_pseudonym(pseudonym: &str) -> Option<(EntityCategory, u64)> {
    let (prefix, digits) = pseudonym.rsplit_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let category = EntityCategory::from_prefix(prefix)?;
    let sequence_number = digits.parse().ok()?;
    Some((category, sequence_number))
}

fn lookup_key(text: &str, category: EntityCategory) -> String {
    format!("{}::{}", category.prefix(), normalize(text).to_lowercase())
}

/// Pseudonym registry shared across a batch
#[derive(Default)]
pub struct MappingStore {
    /// Pseudonym to record
    records: HashMap<String, PseudonymRecord>,
    /// Normalized lookup key to pseudonym
    index: HashMap<String, String>,
    /// Highest sequence number issued per category
    counters: HashMap<EntityCategory, u64>,
}

impl MappingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a saved mapping file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }

    /// Return the pseudonym for `text`, creating one on first sighting
    ///
    /// Fails when the category has no sequence number left.
    pub fn get_or_create(&mut self, text: &str, category: EntityCategory) -> Result<String> {
        let key = lookup_key(text, category);
        if let Some(pseudonym) = self.index.get(&key) {
            return Ok(pseudonym.clone());
        }

        let counter = self.counters.entry(category).or_insert(0);
        let sequence_number = counter.checked_add(1).ok_or_else(|| {
            CaviardeurError::Mapping(format!(
                "No {} pseudonym left after sequence number {}",
                category.prefix(),
                counter
            ))
        })?;
        *counter = sequence_number;
        let pseudonym = format_pseudonym(category, sequence_number);

        self.records.insert(
            pseudonym.clone(),
            PseudonymRecord {
                pseudonym: pseudonym.clone(),
                original_text: text.to_string(),
                category,
                sequence_number,
            },
        );
        self.index.insert(key, pseudonym.clone());

        tracing::trace!(pseudonym = %pseudonym, "Pseudonym created");
        Ok(pseudonym)
    }

    /// Original text behind a pseudonym
    pub fn get_original(&self, pseudonym: &str) -> Option<&str> {
        self.records
            .get(pseudonym)
            .map(|record| record.original_text.as_str())
    }

    /// Pseudonym already assigned to `text`, without creating one
    pub fn get_existing_pseudonym(&self, text: &str, category: EntityCategory) -> Option<&str> {
        self.index
            .get(&lookup_key(text, category))
            .map(String::as_str)
    }

    /// Number of pseudonyms
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest sequence number issued for a category
    pub fn counter(&self, category: EntityCategory) -> u64 {
        self.counters.get(&category).copied().unwrap_or(0)
    }

    /// All records, by category then sequence number
    pub fn records(&self) -> Vec<&PseudonymRecord> {
        let mut records: Vec<&PseudonymRecord> = self.records.values().collect();
        records.sort_by_key(|r| (r.category, r.sequence_number));
        records
    }

    /// Pseudonym to original map, ordered by pseudonym
    pub fn mapping(&self) -> BTreeMap<&str, &str> {
        self.records
            .iter()
            .map(|(pseudonym, record)| (pseudonym.as_str(), record.original_text.as_str()))
            .collect()
    }

    /// Replace every known pseudonym in `text` with its original
    ///
    /// Tokens the store does not know are left untouched.
    pub fn restore_text(&self, text: &str) -> Result<String> {
        let pattern = Regex::new(PSEUDONYM_PATTERN)?;
        let restored = pattern.replace_all(text, |caps: &regex::Captures<'_>| {
            let token = &caps[0];
            self.get_original(token).unwrap_or(token).to_string()
        });
        Ok(restored.into_owned())
    }

    /// Write the mapping as JSON, readable by the owner only
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.mapping())?;

        let tmp_path = path.with_extension("json.tmp");
        write_private(&tmp_path, json.as_bytes())?;
        fs::rename(&tmp_path, path)?;

        tracing::info!(path = %path.display(), entries = self.len(), "Mapping saved");
        Ok(())
    }

    /// Merge a saved mapping into this store
    ///
    /// Entries with an unknown prefix or an unparsable suffix are skipped.
    /// A pseudonym already held by this store keeps its current original;
    /// the saved entry is dropped. Counters move up to the highest restored
    /// sequence number per category. Returns the number of entries added.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CaviardeurError::Mapping(format!(
                "Failed to read mapping file {}: {}",
                path.display(),
                e
            ))
        })?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;

        let mut loaded = 0;
        let mut skipped = 0;
        let mut conflicts = 0;
        for (pseudonym, mut original_text) in entries {
            let Some((category, sequence_number)) = parse_pseudonym(&pseudonym) else {
                original_text.zeroize();
                skipped += 1;
                continue;
            };

            if let Some(existing) = self.records.get(&pseudonym) {
                if lookup_key(&existing.original_text, category)
                    != lookup_key(&original_text, category)
                {
                    conflicts += 1;
                }
                original_text.zeroize();
                continue;
            }

            self.index
                .entry(lookup_key(&original_text, category))
                .or_insert_with(|| pseudonym.clone());

            let counter = self.counters.entry(category).or_insert(0);
            *counter = (*counter).max(sequence_number);

            self.records.insert(
                pseudonym.clone(),
                PseudonymRecord {
                    pseudonym,
                    original_text,
                    category,
                    sequence_number,
                },
            );
            loaded += 1;
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped malformed mapping entries");
        }
        if conflicts > 0 {
            tracing::warn!(conflicts, "Skipped mapping entries reusing an assigned pseudonym");
        }
        tracing::info!(path = %path.display(), loaded, "Mapping loaded");
        Ok(loaded)
    }
}

impl std::fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStore")
            .field("entries", &self.records.len())
            .field("counters", &self.counters)
            .finish()
    }
}

impl Drop for MappingStore {
    fn drop(&mut self) {
        for (mut key, _) in self.index.drain() {
            key.zeroize();
        }
        for (_, mut record) in self.records.drain() {
            record.original_text.zeroize();
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    file.write_all(content)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}
