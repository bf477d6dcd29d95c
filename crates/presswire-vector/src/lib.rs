//! presswire-vector — Qdrant-backed vector index for migrated articles.
//!
//! Hosts the embedding generator (remote model with a deterministic offline
//! fallback) and the article index: collection lifecycle, batched upserts
//! with inline embedding, filtered similarity search, exact-match scroll,
//! deletion and stats.

pub mod embedding;
pub mod error;
pub mod filter;
pub mod store;

pub use embedding::{fallback_embedding, EmbeddingClient, EmbeddingConfig};
pub use error::{Result, VectorError};
pub use filter::SearchFilter;
pub use store::{
    ArticleIndex, ArticlePayload, ArticlePoint, IndexConfig, IndexStats, ScoredArticle,
    SearchOptions,
};
