//! Loading of local model directories (`config.json`, `tokenizer.json`,
//! `model.safetensors` or `pytorch_model.bin`).

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use docqa_core::config::expand_path;

pub fn load_tokenizer(model_dir: &Path, max_len: usize) -> Result<Tokenizer> {
    let path = model_dir.join("tokenizer.json");
    let mut tokenizer = Tokenizer::from_file(&path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(tokenizer)
}

pub fn read_config<T: serde::de::DeserializeOwned>(model_dir: &Path) -> Result<T> {
    let path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&path).map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let tensors: HashMap<String, Tensor> = if safetensors.exists() {
        info!(path = %safetensors.display(), "Loading safetensors weights");
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let pickle = model_dir.join("pytorch_model.bin");
        info!(path = %pickle.display(), "Loading pickle weights");
        candle_core::pickle::read_all(&pickle)?.into_iter().collect()
    };
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

/// Pick the first existing model directory: the configured path, then the
/// given env vars, then the fallback locations relative to the working dir.
pub fn resolve_model_dir(configured: Option<&str>, env_keys: &[&str], fallbacks: &[&str]) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { info!(dir = %p.display(), "Using configured model dir"); return Ok(p); }
        return Err(anyhow!("Configured model directory does not exist: {}", p.display()));
    }
    for key in env_keys {
        if let Ok(dir) = std::env::var(key) {
            let p = expand_path(&dir);
            if p.exists() { info!(dir = %p.display(), "Using {}", key); return Ok(p); }
        }
    }
    for fallback in fallbacks {
        let p = Path::new(fallback);
        if p.exists() { info!(dir = %p.display(), "Using model dir"); return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate model directory (tried {:?} and {:?})", env_keys, fallbacks))
}
