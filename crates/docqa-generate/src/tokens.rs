use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;

use docqa_core::traits::TokenCounter;

/// Token budgeting with the generator's own tokenizer.
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    /// Truncation is switched off so counts reflect the full text.
    pub fn new(mut tokenizer: Tokenizer) -> Result<Self> {
        tokenizer.with_truncation(None).map_err(|e| anyhow!("Failed to disable truncation: {}", e))?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> Result<usize> {
        let enc = self.tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        Ok(enc.get_ids().len())
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> Result<String> {
        let enc = self.tokenizer.encode(text, false).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        if enc.get_ids().len() <= max_tokens {
            return Ok(text.to_string());
        }
        if max_tokens == 0 {
            return Ok(String::new());
        }
        // Cut the input at the last kept token's end offset.
        let end = enc.get_offsets()[max_tokens - 1].1;
        if text.is_char_boundary(end) {
            return Ok(text[..end].to_string());
        }
        self.tokenizer
            .decode(&enc.get_ids()[..max_tokens], true)
            .map_err(|e| anyhow!("Detokenization failed: {}", e))
    }
}
