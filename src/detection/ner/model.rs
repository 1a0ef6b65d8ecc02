//! Token-classification model resource
//!
//! The inference runtime sits behind two traits: [`SubwordTokenizer`] turns a
//! window of text into vocabulary pieces and [`TokenClassifier`] scores each
//! input position against the model's labels. [`NerModel`] bundles one loaded
//! tokenizer/classifier pair with the metadata needed to drive them, and
//! [`ModelCache`] loads each model identifier at most once.

use super::aggregate::{aggregate_bio, predict, RawSpan};
use super::window::{encode_window, SpecialTokens};
use crate::domain::{ModelError, Result};
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default maximum input length, in positions, including BOS and EOS
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// Name of the model metadata file inside a model directory
pub const MODEL_METADATA_FILE: &str = "config.json";

/// One subword piece of a tokenized window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubwordPiece {
    /// Tokenizer-native vocabulary id
    pub id: i64,
    /// First char of the piece, relative to the window
    pub begin: usize,
    /// One past the last char of the piece, relative to the window
    pub end: usize,
}

/// Subword tokenizer seam
pub trait SubwordTokenizer {
    /// Tokenize `text` into pieces with char offsets relative to `text`
    fn encode(&self, text: &str) -> Result<Vec<SubwordPiece>>;

    /// Tokenizer-native begin-of-sequence id
    fn bos_id(&self) -> i64;

    /// Tokenizer-native end-of-sequence id
    fn eos_id(&self) -> i64;
}

/// Token-classification inference seam
pub trait TokenClassifier {
    /// Score every position of `input_ids`
    ///
    /// Returns one row of raw (pre-softmax) label scores per input position.
    fn classify(&self, input_ids: &[i64]) -> Result<Vec<Vec<f32>>>;
}

/// Loads tokenizer and classifier artifacts from a model directory
pub trait InferenceBackend {
    /// Load the subword tokenizer
    fn load_tokenizer(&self, model_dir: &Path) -> Result<Box<dyn SubwordTokenizer>>;

    /// Load the inference session
    fn load_classifier(&self, model_dir: &Path) -> Result<Box<dyn TokenClassifier>>;
}

/// Model metadata read from `config.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelMetadata {
    /// Label id to tag, keys are stringified ids
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    /// Model begin-of-sequence id
    #[serde(default)]
    pub bos_token_id: Option<i64>,
    /// Model end-of-sequence id
    #[serde(default)]
    pub eos_token_id: Option<i64>,
}

impl ModelMetadata {
    /// Read metadata from a `config.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ModelError::ArtifactNotFound(path.display().to_string()).into());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse metadata from JSON content
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ModelError::InvalidMetadata(e.to_string()).into())
    }
}

/// A parsed BIO tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BioTag {
    /// Outside any entity
    Outside,
    /// First token of an entity of the given type
    Begin(String),
    /// Continuation token of an entity of the given type
    Inside(String),
    /// A label outside the BIO scheme; leaves any open span untouched
    Other,
}

impl BioTag {
    /// Parse a model label such as `B-PER`, `I-ORG` or `O`
    pub fn parse(label: &str) -> Self {
        if label == "O" {
            Self::Outside
        } else if let Some(kind) = label.strip_prefix("B-") {
            Self::Begin(kind.to_string())
        } else if let Some(kind) = label.strip_prefix("I-") {
            Self::Inside(kind.to_string())
        } else {
            Self::Other
        }
    }
}

/// Label id to BIO tag table
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    tags: HashMap<usize, BioTag>,
}

impl LabelTable {
    /// Build from `id2label` metadata
    pub fn from_metadata(id2label: &HashMap<String, String>) -> Result<Self> {
        let mut tags = HashMap::with_capacity(id2label.len());
        for (id, label) in id2label {
            let id: usize = id.trim().parse().map_err(|_| {
                ModelError::InvalidMetadata(format!("Non-numeric label id '{id}' in id2label"))
            })?;
            tags.insert(id, BioTag::parse(label));
        }
        Ok(Self { tags })
    }

    /// Build from `(id, label)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        let tags = pairs
            .into_iter()
            .map(|(id, label)| (id, BioTag::parse(label)))
            .collect();
        Self { tags }
    }

    /// Tag for a label id; unknown ids read as `O`
    pub fn tag(&self, id: usize) -> &BioTag {
        self.tags.get(&id).unwrap_or(&BioTag::Outside)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A loaded token-classification model
pub struct NerModel {
    model_id: String,
    tokenizer: Box<dyn SubwordTokenizer>,
    classifier: Box<dyn TokenClassifier>,
    labels: LabelTable,
    special: SpecialTokens,
    max_sequence_length: usize,
}

impl NerModel {
    /// Assemble a model from its metadata and loaded artifacts
    ///
    /// Model BOS/EOS ids fall back to the tokenizer's native ids when the
    /// metadata omits them. Every ordinary piece id is shifted by the
    /// difference between the model and tokenizer BOS ids.
    pub fn new(
        model_id: impl Into<String>,
        metadata: &ModelMetadata,
        tokenizer: Box<dyn SubwordTokenizer>,
        classifier: Box<dyn TokenClassifier>,
    ) -> Result<Self> {
        let labels = LabelTable::from_metadata(&metadata.id2label)?;
        if labels.is_empty() {
            return Err(ModelError::InvalidMetadata("id2label is empty".to_string()).into());
        }

        let bos_id = metadata.bos_token_id.unwrap_or_else(|| tokenizer.bos_id());
        let eos_id = metadata.eos_token_id.unwrap_or_else(|| tokenizer.eos_id());
        let special = SpecialTokens {
            bos_id,
            eos_id,
            vocab_offset: bos_id - tokenizer.bos_id(),
        };

        Ok(Self {
            model_id: model_id.into(),
            tokenizer,
            classifier,
            labels,
            special,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        })
    }

    /// Override the maximum input length (at least 2, for BOS and EOS)
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length.max(2);
        self
    }

    /// Model identifier
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Special token ids and vocabulary offset
    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    /// Maximum input length
    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    /// Run the model over one window and aggregate BIO spans
    ///
    /// Span offsets are chars relative to `window_text`.
    pub fn predict_window(&self, window_text: &str) -> Result<Vec<RawSpan>> {
        let pieces = self.tokenizer.encode(window_text)?;
        let encoded = encode_window(&pieces, &self.special, self.max_sequence_length);

        let scores = self.classifier.classify(&encoded.input_ids)?;
        if scores.len() != encoded.len() {
            return Err(ModelError::ShapeMismatch {
                expected: encoded.len(),
                actual: scores.len(),
            }
            .into());
        }

        let predictions = scores
            .iter()
            .map(|row| {
                predict(row).ok_or_else(|| {
                    ModelError::Inference("Classifier returned an empty score row".to_string())
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(aggregate_bio(&encoded, &predictions, &self.labels))
    }
}

impl std::fmt::Debug for NerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NerModel")
            .field("model_id", &self.model_id)
            .field("labels", &self.labels.len())
            .field("special", &self.special)
            .field("max_sequence_length", &self.max_sequence_length)
            .finish()
    }
}

/// Loads models on first use and keeps them for the life of the cache
///
/// Each model identifier resolves to `<models_dir>/<model_id>/`, which must
/// hold `config.json` plus whatever artifacts the backend needs.
pub struct ModelCache {
    models_dir: PathBuf,
    backend: Box<dyn InferenceBackend>,
    max_sequence_length: usize,
    models: HashMap<String, NerModel>,
}

impl ModelCache {
    /// Create an empty cache
    pub fn new(models_dir: impl Into<PathBuf>, backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            models_dir: models_dir.into(),
            backend,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            models: HashMap::new(),
        }
    }

    /// Maximum input length applied to models loaded from now on
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }

    /// Return the model for `model_id`, loading it on first request
    pub fn get_or_load(&mut self, model_id: &str) -> Result<&NerModel> {
        match self.models.entry(model_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let model = load_model(
                    &self.models_dir,
                    self.backend.as_ref(),
                    model_id,
                    self.max_sequence_length,
                )?;
                Ok(entry.insert(model))
            }
        }
    }

    /// Check whether a model is already loaded
    pub fn is_loaded(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }
}

fn load_model(
    models_dir: &Path,
    backend: &dyn InferenceBackend,
    model_id: &str,
    max_sequence_length: usize,
) -> Result<NerModel> {
    let model_dir = models_dir.join(model_id);
    tracing::info!(model_id = %model_id, model_dir = %model_dir.display(), "Loading NER model");

    let metadata = ModelMetadata::from_file(&model_dir.join(MODEL_METADATA_FILE))?;
    let tokenizer = backend.load_tokenizer(&model_dir)?;
    let classifier = backend.load_classifier(&model_dir)?;
    let model = NerModel::new(model_id, &metadata, tokenizer, classifier)?
        .with_max_sequence_length(max_sequence_length);

    tracing::info!(
        model_id = %model_id,
        labels = model.labels.len(),
        vocab_offset = model.special.vocab_offset,
        "NER model loaded"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CaviardeurError;
    use std::cell::Cell;
    use std::rc::Rc;

    struct WhitespaceTokenizer;

    impl SubwordTokenizer for WhitespaceTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<SubwordPiece>> {
            let mut pieces = Vec::new();
            let mut begin = None;
            for (i, ch) in text.chars().enumerate() {
                match (ch.is_whitespace(), begin) {
                    (false, None) => begin = Some(i),
                    (true, Some(b)) => {
                        pieces.push(SubwordPiece { id: 100, begin: b, end: i });
                        begin = None;
                    }
                    _ => {}
                }
            }
            if let Some(b) = begin {
                pieces.push(SubwordPiece {
                    id: 100,
                    begin: b,
                    end: text.chars().count(),
                });
            }
            Ok(pieces)
        }

        fn bos_id(&self) -> i64 {
            1
        }

        fn eos_id(&self) -> i64 {
            2
        }
    }

    /// Predicts `B-PER` for every ordinary position
    struct PersonClassifier;

    impl TokenClassifier for PersonClassifier {
        fn classify(&self, input_ids: &[i64]) -> Result<Vec<Vec<f32>>> {
            Ok(input_ids
                .iter()
                .map(|&id| if id == 5 || id == 6 { vec![5.0, 0.0] } else { vec![0.0, 5.0] })
                .collect())
        }
    }

    struct ShortClassifier;

    impl TokenClassifier for ShortClassifier {
        fn classify(&self, _input_ids: &[i64]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]])
        }
    }

    fn metadata() -> ModelMetadata {
        ModelMetadata::from_json(
            r#"{"id2label": {"0": "O", "1": "B-PER"}, "bos_token_id": 5, "eos_token_id": 6}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_bio_tag_parse() {
        assert_eq!(BioTag::parse("O"), BioTag::Outside);
        assert_eq!(BioTag::parse("B-PER"), BioTag::Begin("PER".to_string()));
        assert_eq!(BioTag::parse("I-LOC"), BioTag::Inside("LOC".to_string()));
        assert_eq!(BioTag::parse("PER"), BioTag::Other);
    }

    #[test]
    fn test_label_table_rejects_non_numeric_ids() {
        let mut id2label = HashMap::new();
        id2label.insert("zero".to_string(), "O".to_string());
        assert!(LabelTable::from_metadata(&id2label).is_err());
    }

    #[test]
    fn test_label_table_unknown_id_is_outside() {
        let table = LabelTable::from_pairs([(0, "O"), (1, "B-PER")]);
        assert_eq!(table.tag(42), &BioTag::Outside);
        assert_eq!(table.tag(1), &BioTag::Begin("PER".to_string()));
    }

    #[test]
    fn test_vocab_offset_from_bos_difference() {
        let model = NerModel::new(
            "test",
            &metadata(),
            Box::new(WhitespaceTokenizer),
            Box::new(PersonClassifier),
        )
        .unwrap();

        let special = model.special_tokens();
        assert_eq!(special.bos_id, 5);
        assert_eq!(special.eos_id, 6);
        assert_eq!(special.vocab_offset, 4);
    }

    #[test]
    fn test_special_ids_fall_back_to_tokenizer() {
        let metadata =
            ModelMetadata::from_json(r#"{"id2label": {"0": "O", "1": "B-PER"}}"#).unwrap();
        let model = NerModel::new(
            "test",
            &metadata,
            Box::new(WhitespaceTokenizer),
            Box::new(PersonClassifier),
        )
        .unwrap();

        let special = model.special_tokens();
        assert_eq!(special.bos_id, 1);
        assert_eq!(special.eos_id, 2);
        assert_eq!(special.vocab_offset, 0);
    }

    #[test]
    fn test_empty_label_table_is_rejected() {
        let metadata = ModelMetadata::from_json(r#"{"bos_token_id": 5}"#).unwrap();
        let result = NerModel::new(
            "test",
            &metadata,
            Box::new(WhitespaceTokenizer),
            Box::new(PersonClassifier),
        );
        assert!(matches!(
            result,
            Err(CaviardeurError::Model(ModelError::InvalidMetadata(_)))
        ));
    }

    #[test]
    fn test_predict_window_yields_spans() {
        let model = NerModel::new(
            "test",
            &metadata(),
            Box::new(WhitespaceTokenizer),
            Box::new(PersonClassifier),
        )
        .unwrap();

        let spans = model.predict_window("Jean Dupont").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 4));
        assert_eq!((spans[1].start, spans[1].end), (5, 11));
        assert_eq!(spans[0].label, "PER");
    }

    #[test]
    fn test_predict_window_rejects_shape_mismatch() {
        let model = NerModel::new(
            "test",
            &metadata(),
            Box::new(WhitespaceTokenizer),
            Box::new(ShortClassifier),
        )
        .unwrap();

        let err = model.predict_window("Jean Dupont").unwrap_err();
        assert!(matches!(
            err,
            CaviardeurError::Model(ModelError::ShapeMismatch {
                expected: 4,
                actual: 1
            })
        ));
    }

    struct CountingBackend {
        loads: Rc<Cell<usize>>,
    }

    impl InferenceBackend for CountingBackend {
        fn load_tokenizer(&self, _model_dir: &Path) -> Result<Box<dyn SubwordTokenizer>> {
            self.loads.set(self.loads.get() + 1);
            Ok(Box::new(WhitespaceTokenizer))
        }

        fn load_classifier(&self, _model_dir: &Path) -> Result<Box<dyn TokenClassifier>> {
            Ok(Box::new(PersonClassifier))
        }
    }

    #[test]
    fn test_model_cache_loads_once_per_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("org").join("ner-fr");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(
            model_dir.join(MODEL_METADATA_FILE),
            r#"{"id2label": {"0": "O", "1": "B-PER"}, "bos_token_id": 5, "eos_token_id": 6}"#,
        )
        .unwrap();

        let loads = Rc::new(Cell::new(0));
        let mut cache = ModelCache::new(
            dir.path(),
            Box::new(CountingBackend {
                loads: Rc::clone(&loads),
            }),
        )
        .with_max_sequence_length(64);

        assert!(!cache.is_loaded("org/ner-fr"));
        let model = cache.get_or_load("org/ner-fr").unwrap();
        assert_eq!(model.model_id(), "org/ner-fr");
        assert_eq!(model.max_sequence_length(), 64);

        cache.get_or_load("org/ner-fr").unwrap();
        assert_eq!(loads.get(), 1);
        assert!(cache.is_loaded("org/ner-fr"));
    }

    #[test]
    fn test_model_cache_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ModelCache::new(
            dir.path(),
            Box::new(CountingBackend {
                loads: Rc::new(Cell::new(0)),
            }),
        );

        let err = cache.get_or_load("missing/model").unwrap_err();
        assert!(matches!(
            err,
            CaviardeurError::Model(ModelError::ArtifactNotFound(_))
        ));
        assert!(!cache.is_loaded("missing/model"));
    }
}
