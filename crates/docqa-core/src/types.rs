//! Domain types shared by the ingestion and query paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row position of a chunk in the corpus; doubles as its vector row id.
pub type Ordinal = usize;

/// A bounded span of source text that is embedded and indexed on its own.
///
/// - `text`: the passage itself
/// - `source_id`: name of the originating document (file name or caller id)
/// - `page`: 1-based page number for paged sources, `None` for plain text
/// - `ordinal`: position in the corpus, equal to the vector row id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub page: Option<u32>,
    pub ordinal: Ordinal,
}

/// First-stage result: a chunk and its distance to the query (smaller is closer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Second-stage result: a chunk and its reranker relevance (larger is better).
///
/// `relevance_score` is in the scorer's own units and is not comparable to
/// `SearchHit::distance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedHit {
    pub chunk: Chunk,
    pub relevance_score: f32,
}

/// Attribution for one chunk that went into the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_id: String,
    pub page: Option<u32>,
    pub snippet: String,
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} (page {}): {}", self.source_id, page, self.snippet),
            None => write!(f, "{}: {}", self.source_id, self.snippet),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Answered,
    NotIndexed,
}

pub const NOT_INDEXED_MESSAGE: &str =
    "No documents indexed yet. Please upload and process documents first.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub status: QueryStatus,
    pub answer_text: String,
    pub sources: Vec<SourceRef>,
}

impl QueryResult {
    /// Sentinel returned when a query arrives before any corpus was ingested.
    pub fn not_indexed() -> Self {
        Self { status: QueryStatus::NotIndexed, answer_text: NOT_INDEXED_MESSAGE.to_string(), sources: Vec::new() }
    }

    pub fn is_not_indexed(&self) -> bool { self.status == QueryStatus::NotIndexed }
}

/// One page (or the whole body, for plain text) of an ingested document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: Option<u32>,
    pub text: String,
}

/// A loaded document ready to be chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_id: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn plain_text(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), pages: vec![Page { number: None, text: text.into() }] }
    }
}
