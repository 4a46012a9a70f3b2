/// Maps text to fixed-dimension dense vectors.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `local:bert:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Scores a single (query, passage) pair. Higher means more relevant.
///
/// Each call must depend only on its own inputs so pairs can be scored in any
/// order or in parallel.
pub trait PairScorer: Send + Sync {
    fn score(&self, query: &str, passage: &str) -> anyhow::Result<f32>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub do_sample: bool,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub seed: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { max_new_tokens: 200, do_sample: false, temperature: 0.7, top_p: None, seed: 299_792_458 }
    }
}

pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> anyhow::Result<String>;
}

/// Tokenization used to budget prompts for a generator.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> anyhow::Result<usize>;
    /// Longest prefix of `text` that fits in `max_tokens`.
    fn truncate(&self, text: &str, max_tokens: usize) -> anyhow::Result<String>;
}

/// Counts whitespace-separated words; used when no model tokenizer is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> anyhow::Result<usize> { Ok(text.split_whitespace().count()) }

    /// Cuts before the word after the last one kept, so the result is a
    /// verbatim prefix of `text` with trailing whitespace removed.
    fn truncate(&self, text: &str, max_tokens: usize) -> anyhow::Result<String> {
        let mut words = 0;
        let mut prev_is_space = true;
        for (i, c) in text.char_indices() {
            let is_space = c.is_whitespace();
            if !is_space && prev_is_space {
                if words == max_tokens {
                    return Ok(text[..i].trim_end().to_string());
                }
                words += 1;
            }
            prev_is_space = is_space;
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub number: u32,
    pub text: Result<String, String>,
}

/// Splits a paged binary document (PDF) into per-page text.
///
/// A failure on one page is reported in that page's `text`; only a document
/// that cannot be opened at all is an `Err`.
pub trait PageExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> anyhow::Result<Vec<ExtractedPage>>;
}
