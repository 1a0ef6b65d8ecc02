//! RoBERTa encoder with a token-classification head
//!
//! Covers the CamemBERT/XLM-R family exported by `transformers` as
//! `*ForTokenClassification`: weights live under `roberta.` and the head
//! under `classifier.`. Inputs are a single unpadded sequence, so every
//! position attends to every other and position ids start right after the
//! padding id.

use super::model::TokenClassifier;
use crate::domain::{ModelError, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{embedding, layer_norm, linear, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;
use std::collections::HashMap;

/// Encoder prefix in `*ForTokenClassification` checkpoints
const ENCODER_PREFIX: &str = "roberta";

/// Head prefix in `*ForTokenClassification` checkpoints
const HEAD_PREFIX: &str = "classifier";

fn default_type_vocab_size() -> usize {
    1
}

fn default_layer_norm_eps() -> f64 {
    1e-5
}

fn default_pad_token_id() -> u32 {
    1
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

/// Architecture fields of `config.json`
#[derive(Debug, Clone, Deserialize)]
pub struct RobertaConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: u32,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    /// Only its size matters here: one output column per label
    #[serde(default)]
    pub id2label: HashMap<String, String>,
}

impl RobertaConfig {
    /// Parse from `config.json` content
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ModelError::InvalidMetadata(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.hidden_act != "gelu" {
            return Err(ModelError::InvalidMetadata(format!(
                "Unsupported hidden_act '{}'",
                self.hidden_act
            ))
            .into());
        }
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            return Err(ModelError::InvalidMetadata(format!(
                "hidden_size {} is not divisible by num_attention_heads {}",
                self.hidden_size, self.num_attention_heads
            ))
            .into());
        }
        if self.id2label.is_empty() {
            return Err(ModelError::InvalidMetadata("id2label is empty".to_string()).into());
        }
        Ok(())
    }

    /// Number of output labels
    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }

    /// Longest sequence the position table can index
    pub fn max_sequence_length(&self) -> usize {
        self.max_position_embeddings
            .saturating_sub(self.pad_token_id as usize + 1)
    }
}

struct Embeddings {
    word: Embedding,
    position: Embedding,
    token_type: Embedding,
    layer_norm: LayerNorm,
    first_position: u32,
}

impl Embeddings {
    fn load(config: &RobertaConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            word: embedding(config.vocab_size, config.hidden_size, vb.pp("word_embeddings"))?,
            position: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
            first_position: config.pad_token_id + 1,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        let seq_len = input_ids.dim(1)? as u32;
        let positions = Tensor::arange(
            self.first_position,
            self.first_position + seq_len,
            input_ids.device(),
        )?
        .unsqueeze(0)?;
        let token_types = input_ids.zeros_like()?;

        let embeddings = self
            .word
            .forward(input_ids)?
            .add(&self.position.forward(&positions)?)?
            .add(&self.token_type.forward(&token_types)?)?;
        self.layer_norm.forward(&embeddings)
    }
}

struct Attention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    num_heads: usize,
    head_dim: usize,
}

impl Attention {
    fn load(config: &RobertaConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            query: linear(hidden, hidden, vb.pp("self.query"))?,
            key: linear(hidden, hidden, vb.pp("self.key"))?,
            value: linear(hidden, hidden, vb.pp("self.value"))?,
            output: linear(hidden, hidden, vb.pp("output.dense"))?,
            layer_norm: layer_norm(hidden, config.layer_norm_eps, vb.pp("output.LayerNorm"))?,
            num_heads: config.num_attention_heads,
            head_dim: hidden / config.num_attention_heads,
        })
    }

    /// (batch, seq, hidden) to (batch, heads, seq, head_dim)
    fn split_heads(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len, _) = x.dims3()?;
        x.reshape((batch, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    fn forward(&self, hidden: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden.dims3()?;
        let query = self.split_heads(&self.query.forward(hidden)?)?;
        let key = self.split_heads(&self.key.forward(hidden)?)?;
        let value = self.split_heads(&self.value.forward(hidden)?)?;

        let scores = (query.matmul(&key.t()?.contiguous()?)? / (self.head_dim as f64).sqrt())?;
        let probs = candle_nn::ops::softmax_last_dim(&scores)?;
        let context = probs
            .matmul(&value)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, hidden_size))?;

        let projected = self.output.forward(&context)?;
        self.layer_norm.forward(&projected.add(hidden)?)
    }
}

struct FeedForward {
    intermediate: Linear,
    output: Linear,
    layer_norm: LayerNorm,
}

impl FeedForward {
    fn load(config: &RobertaConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            intermediate: linear(
                config.hidden_size,
                config.intermediate_size,
                vb.pp("intermediate.dense"),
            )?,
            output: linear(config.intermediate_size, config.hidden_size, vb.pp("output.dense"))?,
            layer_norm: layer_norm(
                config.hidden_size,
                config.layer_norm_eps,
                vb.pp("output.LayerNorm"),
            )?,
        })
    }

    fn forward(&self, hidden: &Tensor) -> candle_core::Result<Tensor> {
        let expanded = self.intermediate.forward(hidden)?.gelu_erf()?;
        let projected = self.output.forward(&expanded)?;
        self.layer_norm.forward(&projected.add(hidden)?)
    }
}

struct EncoderLayer {
    attention: Attention,
    feed_forward: FeedForward,
}

/// Encoder plus linear head, scoring every input position
pub struct RobertaTokenClassifier {
    embeddings: Embeddings,
    layers: Vec<EncoderLayer>,
    classifier: Linear,
    vocab_size: usize,
    max_sequence_length: usize,
    device: Device,
}

impl RobertaTokenClassifier {
    /// Build the network from checkpoint variables
    pub fn load(config: &RobertaConfig, vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let encoder = vb.pp(ENCODER_PREFIX);
        let embeddings = Embeddings::load(config, encoder.pp("embeddings"))?;

        let layers = (0..config.num_hidden_layers)
            .map(|i| {
                let layer = encoder.pp(format!("encoder.layer.{i}"));
                Ok(EncoderLayer {
                    attention: Attention::load(config, layer.pp("attention"))?,
                    feed_forward: FeedForward::load(config, layer.clone())?,
                })
            })
            .collect::<candle_core::Result<Vec<_>>>()?;

        let classifier = linear(config.hidden_size, config.num_labels(), vb.pp(HEAD_PREFIX))?;

        Ok(Self {
            embeddings,
            layers,
            classifier,
            vocab_size: config.vocab_size,
            max_sequence_length: config.max_sequence_length(),
            device,
        })
    }

    /// Logits tensor of shape (1, seq, labels)
    fn forward(&self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        let mut hidden = self.embeddings.forward(input_ids)?;
        for layer in &self.layers {
            hidden = layer.attention.forward(&hidden)?;
            hidden = layer.feed_forward.forward(&hidden)?;
        }
        self.classifier.forward(&hidden)
    }
}

impl TokenClassifier for RobertaTokenClassifier {
    fn classify(&self, input_ids: &[i64]) -> Result<Vec<Vec<f32>>> {
        if input_ids.len() > self.max_sequence_length {
            return Err(ModelError::Inference(format!(
                "{} positions exceed the model limit of {}",
                input_ids.len(),
                self.max_sequence_length
            ))
            .into());
        }

        let ids = input_ids
            .iter()
            .map(|&id| {
                u32::try_from(id)
                    .ok()
                    .filter(|&id| (id as usize) < self.vocab_size)
                    .ok_or_else(|| ModelError::Inference(format!("Invalid token id {id}")))
            })
            .collect::<std::result::Result<Vec<u32>, _>>()?;

        let len = ids.len();
        let input = Tensor::from_vec(ids, (1, len), &self.device)?;
        let logits = self.forward(&input)?.squeeze(0)?.to_dtype(DType::F32)?;
        Ok(logits.to_vec2::<f32>()?)
    }
}

impl std::fmt::Debug for RobertaTokenClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobertaTokenClassifier")
            .field("layers", &self.layers.len())
            .field("max_sequence_length", &self.max_sequence_length)
            .finish()
    }
}
