use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer};

/// Model inputs for a padded batch, all shaped `[B, T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<EncodedBatch> {
    let encodings = texts
        .iter()
        .map(|t| tokenizer.encode(t.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e)))
        .collect::<Result<Vec<_>>>()?;
    to_batch(&encodings, pad_id(tokenizer), max_len, device)
}

/// Encode a `(query, passage)` pair as one sequence with segment ids.
pub fn tokenize_pair(tokenizer: &Tokenizer, first: &str, second: &str, max_len: usize, device: &Device) -> Result<EncodedBatch> {
    let enc = tokenizer.encode((first, second), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    to_batch(std::slice::from_ref(&enc), pad_id(tokenizer), max_len, device)
}

fn pad_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer.get_padding().map_or(0, |p| p.pad_id)
}

fn to_batch(encodings: &[Encoding], pad_id: u32, max_len: usize, device: &Device) -> Result<EncodedBatch> {
    let width = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(encodings.len() * width);
    let mut type_ids = Vec::with_capacity(encodings.len() * width);
    let mut mask = Vec::with_capacity(encodings.len() * width);
    for enc in encodings {
        let len = enc.get_ids().len().min(max_len);
        ids.extend_from_slice(&enc.get_ids()[..len]);
        type_ids.extend_from_slice(&enc.get_type_ids()[..len]);
        mask.extend_from_slice(&enc.get_attention_mask()[..len]);
        let pad = width - len;
        ids.extend(std::iter::repeat(pad_id).take(pad));
        type_ids.extend(std::iter::repeat(0).take(pad));
        mask.extend(std::iter::repeat(0).take(pad));
    }
    let shape = (encodings.len(), width);
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, shape, device)?,
        token_type_ids: Tensor::from_vec(type_ids, shape, device)?,
        attention_mask: Tensor::from_vec(mask, shape, device)?,
    })
}
