//! Persistence interfaces the orchestrator writes through.
//!
//! A run may be configured with the relational sink, the vector sink, or
//! both; the pipeline only sees these traits, so tests swap in in-memory
//! fakes and production wires up Postgres and Qdrant.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use presswire_db::{ArticleRepository, ChannelRepository, NewArticle};
use presswire_vector::{ArticleIndex, ArticlePoint};

#[async_trait]
pub trait RelationalSink: Send + Sync {
    /// Look the channel up by name, creating it when absent.
    async fn ensure_channel(&self, name: &str) -> anyhow::Result<Uuid>;

    async fn insert_article(&self, article: &NewArticle) -> anyhow::Result<Uuid>;
}

#[async_trait]
pub trait VectorSink: Send + Sync {
    /// Make sure the target collection exists. Idempotent.
    async fn init(&self) -> anyhow::Result<()>;

    /// Upsert a batch of points; returns how many were written.
    async fn upsert_batch(&self, points: Vec<ArticlePoint>) -> anyhow::Result<usize>;
}

// ── Production implementations ────────────────────────────────────────────────

pub struct PostgresSink {
    channels: ChannelRepository,
    articles: ArticleRepository,
}

impl PostgresSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            channels: ChannelRepository::new(pool.clone()),
            articles: ArticleRepository::new(pool),
        }
    }
}

#[async_trait]
impl RelationalSink for PostgresSink {
    async fn ensure_channel(&self, name: &str) -> anyhow::Result<Uuid> {
        Ok(self.channels.ensure(name).await?)
    }

    async fn insert_article(&self, article: &NewArticle) -> anyhow::Result<Uuid> {
        Ok(self.articles.insert(article).await?)
    }
}

#[async_trait]
impl VectorSink for ArticleIndex {
    async fn init(&self) -> anyhow::Result<()> {
        Ok(self.init_collection().await?)
    }

    async fn upsert_batch(&self, points: Vec<ArticlePoint>) -> anyhow::Result<usize> {
        Ok(ArticleIndex::upsert_batch(self, points).await?)
    }
}
