//! Cross-encoder relevance model: a BERT encoder over `[CLS] query [SEP] passage [SEP]`,
//! the pooler (`dense` + tanh on the CLS state) and a single-logit classifier,
//! in the layout of the ms-marco MiniLM cross-encoders.

use anyhow::{anyhow, Result};
use candle_core::{Device, IndexOp};
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

use docqa_core::traits::PairScorer;
use docqa_embed::device::select_device;
use docqa_embed::tokenize::tokenize_pair;
use docqa_embed::weights::{load_tokenizer, load_var_builder, read_config};

pub struct CrossEncoderScorer {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl CrossEncoderScorer {
    pub fn new(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "Loading cross-encoder");
        let tokenizer = load_tokenizer(model_dir, max_len)?;
        let config: BertConfig = read_config(model_dir)?;
        let raw: serde_json::Value = read_config(model_dir)?;
        let hidden = raw["hidden_size"].as_u64().ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let vb = load_var_builder(model_dir, &device)?;
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = linear(hidden, hidden, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(hidden, 1, vb.pp("classifier"))?;
        Ok(Self { bert, pooler, classifier, tokenizer, device, max_len })
    }
}

impl PairScorer for CrossEncoderScorer {
    fn score(&self, query: &str, passage: &str) -> Result<f32> {
        let batch = tokenize_pair(&self.tokenizer, query, passage, self.max_len, &self.device)?;
        let hidden = self.bert.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;
        let score = logits.flatten_all()?.to_device(&Device::Cpu)?.to_vec1::<f32>()?;
        score.first().copied().ok_or_else(|| anyhow!("cross-encoder produced no logit"))
    }
}
