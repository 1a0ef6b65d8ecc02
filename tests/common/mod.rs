//! Shared test doubles for the sequence-labeling model seams
//!
//! The tokenizer splits on alphanumeric runs and gives every known word its
//! own vocabulary id; the classifier tags those ids from a fixed table.

#![allow(dead_code)]

use caviardeur::detection::ner::{
    InferenceBackend, ModelMetadata, NerModel, SubwordPiece, SubwordTokenizer, TokenClassifier,
};
use caviardeur::domain::Result;
use std::fs;
use std::path::Path;

/// Label table shared by every fake model
pub const LABELS_JSON: &str = r#"{
    "id2label": {
        "0": "O",
        "1": "B-PER", "2": "I-PER",
        "3": "B-ORG", "4": "I-ORG",
        "5": "B-LOC", "6": "I-LOC"
    }
}"#;

pub const O: usize = 0;
pub const B_PER: usize = 1;
pub const I_PER: usize = 2;
pub const B_ORG: usize = 3;
pub const I_ORG: usize = 4;
pub const B_LOC: usize = 5;
pub const I_LOC: usize = 6;

const LABEL_COUNT: usize = 7;
const BOS_ID: i64 = 0;
const EOS_ID: i64 = 2;
const UNKNOWN_ID: i64 = 3;
const FIRST_WORD_ID: i64 = 10;

/// Word to label id table
#[derive(Clone, Default)]
pub struct Lexicon {
    words: Vec<(String, usize)>,
}

impl Lexicon {
    pub fn new(words: &[(&str, usize)]) -> Self {
        Self {
            words: words.iter().map(|(w, l)| (w.to_string(), *l)).collect(),
        }
    }

    fn id_of(&self, word: &str) -> i64 {
        self.words
            .iter()
            .position(|(w, _)| w == word)
            .map(|i| FIRST_WORD_ID + i as i64)
            .unwrap_or(UNKNOWN_ID)
    }

    fn label_of(&self, id: i64) -> usize {
        if id < FIRST_WORD_ID {
            return O;
        }
        self.words
            .get((id - FIRST_WORD_ID) as usize)
            .map(|(_, label)| *label)
            .unwrap_or(O)
    }
}

pub struct LexiconTokenizer {
    lexicon: Lexicon,
}

impl SubwordTokenizer for LexiconTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<SubwordPiece>> {
        let chars: Vec<char> = text.chars().collect();
        let mut pieces = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if !chars[i].is_alphanumeric() {
                i += 1;
                continue;
            }
            let begin = i;
            while i < chars.len() && chars[i].is_alphanumeric() {
                i += 1;
            }
            let word: String = chars[begin..i].iter().collect();
            pieces.push(SubwordPiece {
                id: self.lexicon.id_of(&word),
                begin,
                end: i,
            });
        }
        Ok(pieces)
    }

    fn bos_id(&self) -> i64 {
        BOS_ID
    }

    fn eos_id(&self) -> i64 {
        EOS_ID
    }
}

/// Puts `logit` on the looked-up label and zero elsewhere
pub struct LexiconClassifier {
    lexicon: Lexicon,
    logit: f32,
}

impl TokenClassifier for LexiconClassifier {
    fn classify(&self, input_ids: &[i64]) -> Result<Vec<Vec<f32>>> {
        Ok(input_ids
            .iter()
            .map(|&id| {
                let mut row = vec![0.0; LABEL_COUNT];
                row[self.lexicon.label_of(id)] = self.logit;
                row
            })
            .collect())
    }
}

/// Backend handing out lexicon-driven artifacts
pub struct LexiconBackend {
    pub lexicon: Lexicon,
    pub logit: f32,
}

impl LexiconBackend {
    pub fn new(words: &[(&str, usize)]) -> Self {
        Self {
            lexicon: Lexicon::new(words),
            logit: 20.0,
        }
    }

    pub fn with_logit(mut self, logit: f32) -> Self {
        self.logit = logit;
        self
    }
}

impl InferenceBackend for LexiconBackend {
    fn load_tokenizer(&self, _model_dir: &Path) -> Result<Box<dyn SubwordTokenizer>> {
        Ok(Box::new(LexiconTokenizer {
            lexicon: self.lexicon.clone(),
        }))
    }

    fn load_classifier(&self, _model_dir: &Path) -> Result<Box<dyn TokenClassifier>> {
        Ok(Box::new(LexiconClassifier {
            lexicon: self.lexicon.clone(),
            logit: self.logit,
        }))
    }
}

/// Build a model directly, without a model directory
pub fn lexicon_model(words: &[(&str, usize)], logit: f32) -> NerModel {
    let backend = LexiconBackend::new(words).with_logit(logit);
    let metadata = ModelMetadata::from_json(LABELS_JSON).expect("valid labels");
    NerModel::new(
        "lexicon",
        &metadata,
        backend.load_tokenizer(Path::new(".")).expect("tokenizer"),
        backend.load_classifier(Path::new(".")).expect("classifier"),
    )
    .expect("model")
}

/// Lay out `<models_dir>/<model_id>/config.json`
pub fn write_model_dir(models_dir: &Path, model_id: &str) {
    let model_dir = models_dir.join(model_id);
    fs::create_dir_all(&model_dir).expect("model dir");
    fs::write(model_dir.join("config.json"), LABELS_JSON).expect("config.json");
}

/// Probability the classifier gives its chosen label for a given logit
pub fn confidence_for(logit: f32) -> f32 {
    let e = logit.exp();
    e / (e + (LABEL_COUNT - 1) as f32)
}

/// Lexicon used by the pipeline tests
pub fn contract_lexicon() -> Vec<(&'static str, usize)> {
    vec![
        ("Jean", B_PER),
        ("Dupont", I_PER),
        ("Élise", B_PER),
        ("Durand", I_PER),
        ("Nextech", B_ORG),
        ("Solutions", I_ORG),
    ]
}
