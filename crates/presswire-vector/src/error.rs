//! Vector index error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorError>;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Qdrant error: {0}")]
    Qdrant(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidEmbeddingDimension { expected: usize, actual: usize },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<qdrant_client::QdrantError> for VectorError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        VectorError::Qdrant(err.to_string())
    }
}
