//! Passage chunking.
//!
//! The default strategy is a character sliding window: windows of
//! `chunk_size` characters advance by `chunk_size - overlap`, blank windows are
//! dropped, and the walk stops after the first window that reaches the end of
//! the text. A sentence-packing strategy is available for prose-heavy corpora.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 300;
pub const DEFAULT_OVERLAP: usize = 50;
pub const DEFAULT_MAX_WORDS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    #[default]
    Window,
    Sentence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    pub chunk_size: usize,
    pub overlap: usize,
    pub max_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { strategy: ChunkStrategy::Window, chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP, max_words: DEFAULT_MAX_WORDS }
    }
}

impl ChunkingConfig {
    pub fn window(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            ChunkStrategy::Window => validate_window(self.chunk_size, self.overlap),
            ChunkStrategy::Sentence if self.max_words == 0 => {
                Err(Error::InvalidConfig("max_words must be greater than 0".to_string()))
            }
            ChunkStrategy::Sentence => Ok(()),
        }
    }

    pub fn split(&self, text: &str) -> Result<Vec<String>> {
        match self.strategy {
            ChunkStrategy::Window => chunk(text, self.chunk_size, self.overlap),
            ChunkStrategy::Sentence => {
                self.validate()?;
                Ok(chunk_sentences(text, self.max_words))
            }
        }
    }
}

fn validate_window(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfig("chunk_size must be greater than 0".to_string()));
    }
    if overlap >= chunk_size {
        return Err(Error::InvalidConfig(format!("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")));
    }
    Ok(())
}

/// Split `text` into overlapping character windows, in document order.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate_window(chunk_size, overlap)?;
    // Byte offset of every char boundary, including the end of the text.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let len = bounds.len() - 1;
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + chunk_size).min(len);
        let window = &text[bounds[start]..bounds[end]];
        if !window.trim().is_empty() {
            chunks.push(window.to_string());
        }
        if end >= len {
            break;
        }
        start += step;
    }
    Ok(chunks)
}

/// Pack `.`-terminated sentences into chunks of fewer than `max_words` words.
pub fn chunk_sentences(text: &str, max_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in text.split('.') {
        if sentence.trim().is_empty() {
            continue;
        }
        let candidate_words = current.split_whitespace().count() + sentence.split_whitespace().count();
        if candidate_words >= max_words && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(sentence);
        current.push('.');
    }
    let tail = current.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }
    chunks
}

/// Chunk every page of every document into one corpus; ordinals follow
/// insertion order starting at 0.
pub fn build_corpus(docs: &[Document], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;
    let mut corpus = Vec::new();
    for doc in docs {
        for page in &doc.pages {
            for text in config.split(&page.text)? {
                let ordinal = corpus.len();
                corpus.push(Chunk { text, source_id: doc.source_id.clone(), page: page.number, ordinal });
            }
        }
    }
    Ok(corpus)
}
