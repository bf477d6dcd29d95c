//! Article repository — migrated rows with preserved source metadata.
//!
//! Writes are additive: the pipeline only inserts, and the original source
//! record survives in the `source_metadata` JSONB column. That blob is the
//! sole place the raw pre-cleaning data exists after a migration.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;

/// An article ready for insertion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub channel_id: Uuid,
    pub published_at: Option<DateTime<Utc>>,
    /// Original identifiers, slugs, category/topic ids, hit counts,
    /// attachment structures and the uncleaned body.
    pub source_metadata: serde_json::Value,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub channel_id: Uuid,
    pub published_at: Option<DateTime<Utc>>,
    pub analysis_completed: bool,
    pub source_metadata: serde_json::Value,
    pub migrated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ArticleRepository {
    pool: PgPool,
}

impl ArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a migrated article. `analysis_completed` starts false; the
    /// analysis phase flips it later.
    #[instrument(skip(self, article), fields(channel_id = %article.channel_id))]
    pub async fn insert(&self, article: &NewArticle) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO articles
                (title, content, summary, channel_id, published_at,
                 analysis_completed, source_metadata, migrated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, NOW())
            RETURNING id
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(article.channel_id)
        .bind(article.published_at)
        .bind(&article.source_metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list_by_channel(&self, channel_id: Uuid, limit: i64) -> Result<Vec<ArticleRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, title, content, summary, channel_id, published_at,
                   analysis_completed, source_metadata, migrated_at
            FROM articles
            WHERE channel_id = $1
            ORDER BY migrated_at DESC
            LIMIT $2
            "#,
        )
        .bind(channel_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_by_channel(&self, channel_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE channel_id = $1")
            .bind(channel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
