//! Channel repository — insert-if-absent-by-name semantics.
//!
//! A channel groups the articles migrated from one external source. The
//! pipeline resolves its channel once per run by name; the unique name
//! constraint makes `ensure` idempotent under concurrent runs.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{DbError, Result};

/// Lifecycle of a channel's migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Pending    => "pending",
            ChannelStatus::InProgress => "in_progress",
            ChannelStatus::Completed  => "completed",
            ChannelStatus::Failed     => "failed",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ChannelRepository {
    pool: PgPool,
}

impl ChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Channel>> {
        let channel = sqlx::query_as(
            "SELECT id, name, description, status, created_at FROM channels WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(channel)
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Channel> {
        let channel = sqlx::query_as(
            r#"
            INSERT INTO channels (name, description, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, name, description, status, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(channel)
    }

    /// Look the channel up by name, creating it when absent.
    ///
    /// ON CONFLICT DO NOTHING plus a re-fetch keeps this idempotent when two
    /// runs race on the same name.
    #[instrument(skip(self))]
    pub async fn ensure(&self, name: &str) -> Result<Uuid> {
        if let Some(channel) = self.find_by_name(name).await? {
            debug!(channel_id = %channel.id, "Channel already present");
            return Ok(channel.id);
        }

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO channels (name, status)
            VALUES ($1, 'pending')
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok(id),
            None => self
                .find_by_name(name)
                .await?
                .map(|c| c.id)
                .ok_or_else(|| DbError::ChannelNotFound(name.to_string())),
        }
    }

    pub async fn set_status(&self, id: Uuid, status: ChannelStatus) -> Result<()> {
        sqlx::query("UPDATE channels SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_schema_enum() {
        assert_eq!(ChannelStatus::Pending.as_str(), "pending");
        assert_eq!(ChannelStatus::InProgress.as_str(), "in_progress");
        assert_eq!(ChannelStatus::Completed.as_str(), "completed");
        assert_eq!(ChannelStatus::Failed.as_str(), "failed");
    }
}
