use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresswireError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Source store error: {0}")]
    Source(#[from] mongodb::error::Error),

    #[error("Vector index error: {0}")]
    Vector(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PresswireError>;
