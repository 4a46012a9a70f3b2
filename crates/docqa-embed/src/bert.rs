//! Sentence embeddings from a local BERT-family encoder (e.g. all-MiniLM-L6-v2)
//! with masked mean pooling and L2 normalisation.

use anyhow::{anyhow, Result};
use candle_core::Device;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;
use crate::weights::{load_tokenizer, load_var_builder, read_config};

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl BertEmbedder {
    pub fn new(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "Loading embedding model");
        let tokenizer = load_tokenizer(model_dir, max_len)?;
        let config: BertConfig = read_config(model_dir)?;
        let raw: serde_json::Value = read_config(model_dir)?;
        let dim = raw["hidden_size"]
            .as_u64()
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let vb = load_var_builder(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let name = model_dir.file_name().map_or_else(|| "bert".to_string(), |n| n.to_string_lossy().to_string());
        let id = format!("local:{}:d{}", name, dim);
        info!(embedder_id = %id, "Embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }
}

impl Embedder for BertEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let batch = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Embedded batch");
        Ok(vectors)
    }
}
