use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("At least one index must be provided")]
    NoIndexes,

    #[error("Embedding function not provided")]
    MissingEmbedder,

    #[error("Document must contain a non-empty 'content' string")]
    MissingContent,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    #[error("Vector dimension mismatch. Expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("k must be a positive integer")]
    InvalidK,

    #[error("k_rrf must be non-negative, got {0}")]
    InvalidRrfConstant(f32),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Reranking failed: {0}")]
    Reranker(#[source] anyhow::Error),
}

impl Error {
    /// Configuration problems detected at construction time.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::NoIndexes | Self::MissingEmbedder)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
