//! Local seq2seq answer generation with a T5-family model (e.g. flan-t5-small).

use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::traits::{GenerationParams, Generator};
use docqa_embed::device::select_device;
use docqa_embed::weights::{load_tokenizer, load_var_builder, read_config};

pub const T5_MAX_INPUT_TOKENS: usize = 512;

pub struct T5Generator {
    // Decoding keeps a KV cache, so the model is used by one request at a time.
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    decoder_start_token_id: u32,
    eos_token_id: u32,
}

impl T5Generator {
    pub fn new(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "Loading generation model");
        let tokenizer = load_tokenizer(model_dir, T5_MAX_INPUT_TOKENS)?;
        let mut config: T5Config = read_config(model_dir)?;
        config.use_cache = true;
        let vb = load_var_builder(model_dir, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        let decoder_start_token_id = config.decoder_start_token_id.unwrap_or(config.pad_token_id) as u32;
        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            decoder_start_token_id,
            eos_token_id: config.eos_token_id as u32,
        })
    }

    /// Tokenizer used for prompt budgeting; the same one the encoder sees.
    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }
}

impl Generator for T5Generator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let start = Instant::now();
        let enc = self.tokenizer.encode(prompt, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let input_ids = Tensor::new(enc.get_ids(), &self.device)?.unsqueeze(0)?;

        let temperature = params.do_sample.then_some(params.temperature);
        let mut sampler = LogitsProcessor::new(params.seed, temperature, params.top_p);

        let mut model = self.model.lock().map_err(|_| anyhow!("generation model lock poisoned"))?;
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;

        let mut tokens = vec![self.decoder_start_token_id];
        let mut generated = Vec::new();
        for step in 0..params.max_new_tokens {
            // With the KV cache only the newest token is fed back.
            let context = if step == 0 { &tokens[..] } else { &tokens[tokens.len() - 1..] };
            let decoder_ids = Tensor::new(context, &self.device)?.unsqueeze(0)?;
            let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
            let next = sampler.sample(&logits)?;
            if next == self.eos_token_id {
                break;
            }
            tokens.push(next);
            generated.push(next);
        }
        model.clear_kv_cache();
        drop(model);

        let text = self.tokenizer.decode(&generated, true).map_err(|e| anyhow!("Detokenization failed: {}", e))?;
        debug!(
            prompt_tokens = enc.get_ids().len(),
            new_tokens = generated.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated answer"
        );
        Ok(text.trim().to_string())
    }
}
