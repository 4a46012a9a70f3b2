use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Reranker unavailable: {0}")]
    RerankUnavailable(String),

    #[error("Generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("No documents indexed yet")]
    IndexNotBuilt,

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch { what: String, expected: usize, found: usize },

    #[error("Text extraction failed for {source_id}: {message}")]
    Extraction { source_id: String, message: String },

    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
