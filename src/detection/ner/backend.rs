//! Local inference backend on candle and `tokenizers`
//!
//! A model directory holds the files `transformers` exports for a
//! token-classification checkpoint:
//!
//! - `config.json`: labels, special token ids and architecture
//! - `tokenizer.json`: the fast tokenizer
//! - `model.safetensors`, or `pytorch_model.bin` when no safetensors export
//!   exists
//!
//! Inference runs on the CPU in `f32`.

use super::model::{
    InferenceBackend, SubwordPiece, SubwordTokenizer, TokenClassifier, MODEL_METADATA_FILE,
};
use super::roberta::{RobertaConfig, RobertaTokenClassifier};
use crate::domain::{ModelError, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use std::path::Path;
use tokenizers::Tokenizer;

/// Fast tokenizer file
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Preferred weights file
pub const SAFETENSORS_FILE: &str = "model.safetensors";

/// Fallback weights file
pub const PYTORCH_WEIGHTS_FILE: &str = "pytorch_model.bin";

const BOS_TOKEN: &str = "<s>";
const EOS_TOKEN: &str = "</s>";

/// Subword tokenizer read from `tokenizer.json`
///
/// Pieces come back without special tokens and with char offsets.
pub struct PretrainedTokenizer {
    inner: Tokenizer,
    bos_id: i64,
    eos_id: i64,
}

impl PretrainedTokenizer {
    /// Load a tokenizer file
    ///
    /// Truncation and padding stored in the file are turned off; windows
    /// are bounded by the caller.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ModelError::ArtifactNotFound(path.display().to_string()).into());
        }
        let mut inner = Tokenizer::from_file(path)
            .map_err(|e| ModelError::Tokenization(format!("{}: {e}", path.display())))?;
        inner
            .with_truncation(None)
            .map_err(|e| ModelError::Tokenization(e.to_string()))?;
        inner.with_padding(None);

        let bos_id = special_token_id(&inner, BOS_TOKEN)?;
        let eos_id = special_token_id(&inner, EOS_TOKEN)?;
        Ok(Self {
            inner,
            bos_id,
            eos_id,
        })
    }
}

fn special_token_id(tokenizer: &Tokenizer, token: &str) -> Result<i64> {
    tokenizer
        .token_to_id(token)
        .map(i64::from)
        .ok_or_else(|| {
            ModelError::InvalidMetadata(format!("Tokenizer has no '{token}' token")).into()
        })
}

impl SubwordTokenizer for PretrainedTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<SubwordPiece>> {
        let encoding = self
            .inner
            .encode_char_offsets(text, false)
            .map_err(|e| ModelError::Tokenization(e.to_string()))?;

        Ok(encoding
            .get_ids()
            .iter()
            .zip(encoding.get_offsets())
            .map(|(&id, &(begin, end))| SubwordPiece {
                id: i64::from(id),
                begin,
                end,
            })
            .collect())
    }

    fn bos_id(&self) -> i64 {
        self.bos_id
    }

    fn eos_id(&self) -> i64 {
        self.eos_id
    }
}

/// Loads tokenizer and RoBERTa classifier from a model directory
#[derive(Debug, Clone)]
pub struct CandleBackend {
    device: Device,
}

impl CandleBackend {
    /// Backend running on the CPU
    pub fn new() -> Self {
        Self {
            device: Device::Cpu,
        }
    }

    fn weights(&self, model_dir: &Path) -> Result<VarBuilder<'static>> {
        let safetensors = model_dir.join(SAFETENSORS_FILE);
        if safetensors.exists() {
            let data = std::fs::read(&safetensors)?;
            return Ok(VarBuilder::from_buffered_safetensors(
                data,
                DType::F32,
                &self.device,
            )?);
        }

        let pytorch = model_dir.join(PYTORCH_WEIGHTS_FILE);
        if pytorch.exists() {
            return Ok(VarBuilder::from_pth(&pytorch, DType::F32, &self.device)?);
        }

        Err(ModelError::ArtifactNotFound(format!(
            "{} or {} in {}",
            SAFETENSORS_FILE,
            PYTORCH_WEIGHTS_FILE,
            model_dir.display()
        ))
        .into())
    }
}

impl Default for CandleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for CandleBackend {
    fn load_tokenizer(&self, model_dir: &Path) -> Result<Box<dyn SubwordTokenizer>> {
        let tokenizer = PretrainedTokenizer::from_file(&model_dir.join(TOKENIZER_FILE))?;
        tracing::debug!(
            bos_id = tokenizer.bos_id,
            eos_id = tokenizer.eos_id,
            "Tokenizer loaded"
        );
        Ok(Box::new(tokenizer))
    }

    fn load_classifier(&self, model_dir: &Path) -> Result<Box<dyn TokenClassifier>> {
        let config_path = model_dir.join(MODEL_METADATA_FILE);
        if !config_path.exists() {
            return Err(ModelError::ArtifactNotFound(config_path.display().to_string()).into());
        }
        let config = RobertaConfig::from_json(&std::fs::read_to_string(&config_path)?)?;

        let classifier = RobertaTokenClassifier::load(&config, self.weights(model_dir)?)?;
        tracing::debug!(
            layers = config.num_hidden_layers,
            labels = config.num_labels(),
            "Classifier loaded"
        );
        Ok(Box::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ner::roberta::tests::TINY_CONFIG;
    use candle_nn::VarMap;
    use std::fs;
    use tempfile::TempDir;

    /// Word-level tokenizer splitting on whitespace and punctuation
    const WORD_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": {"direction": "Right", "max_length": 3, "strategy": "LongestFirst", "stride": 0},
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3, "Élise": 10, "Durand": 11, ".": 12},
            "unk_token": "<unk>"
        }
    }"#;

    fn write_model_dir(dir: &Path) {
        fs::write(dir.join(MODEL_METADATA_FILE), TINY_CONFIG).unwrap();
        fs::write(dir.join(TOKENIZER_FILE), WORD_TOKENIZER).unwrap();

        let config = RobertaConfig::from_json(TINY_CONFIG).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        RobertaTokenClassifier::load(&config, vb).unwrap();
        varmap.save(dir.join(SAFETENSORS_FILE)).unwrap();
    }

    #[test]
    fn test_tokenizer_reports_char_offsets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(TOKENIZER_FILE);
        fs::write(&path, WORD_TOKENIZER).unwrap();

        let tokenizer = PretrainedTokenizer::from_file(&path).unwrap();
        let pieces = tokenizer.encode("Élise Durand. Paris").unwrap();

        assert_eq!(tokenizer.bos_id(), 0);
        assert_eq!(tokenizer.eos_id(), 2);
        // Truncation from the file is off
        assert_eq!(pieces.len(), 4);
        assert_eq!(
            pieces[..3],
            [
                SubwordPiece { id: 10, begin: 0, end: 5 },
                SubwordPiece { id: 11, begin: 6, end: 12 },
                SubwordPiece { id: 12, begin: 12, end: 13 },
            ]
        );
        assert_eq!(pieces[3], SubwordPiece { id: 3, begin: 14, end: 19 });
    }

    #[test]
    fn test_missing_tokenizer_is_artifact_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = CandleBackend::new()
            .load_tokenizer(temp_dir.path())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            crate::domain::CaviardeurError::Model(ModelError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_missing_weights_is_artifact_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(MODEL_METADATA_FILE), TINY_CONFIG).unwrap();

        let err = CandleBackend::new()
            .load_classifier(temp_dir.path())
            .err()
            .unwrap();
        assert!(err.to_string().contains(SAFETENSORS_FILE));
    }

    #[test]
    fn test_classifier_loads_saved_weights() {
        let temp_dir = TempDir::new().unwrap();
        write_model_dir(temp_dir.path());

        let backend = CandleBackend::new();
        let classifier = backend.load_classifier(temp_dir.path()).unwrap();
        let first = classifier.classify(&[0, 10, 11, 2]).unwrap();
        let second = classifier.classify(&[0, 10, 11, 2]).unwrap();

        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|row| row.len() == 3));
        assert_eq!(first, second);
    }
}
