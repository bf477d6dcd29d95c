//! Migration job state and the job-store interface.
//!
//! The orchestrator records a snapshot after every batch; the status-query
//! surface reads the same store. Durable backings (cache, database) are
//! external collaborators — the in-memory store here covers single-process
//! runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use presswire_common::{PresswireError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending   => "pending",
            JobStatus::Running   => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed    => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Snapshot of one migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub total: u64,
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Resumption cursor: id of the last source record seen.
    pub last_source_id: Option<String>,
}

impl MigrationJob {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            total: 0,
            processed: 0,
            skipped: 0,
            failed: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
            last_source_id: None,
        }
    }
}

impl Default for MigrationJob {
    fn default() -> Self {
        Self::new()
    }
}

/// Where job snapshots live between status polls.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &MigrationJob) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<MigrationJob>;
    async fn update(&self, job: &MigrationJob) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, MigrationJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &MigrationJob) -> Result<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<MigrationJob> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(PresswireError::JobNotFound(id))
    }

    async fn update(&self, job: &MigrationJob) -> Result<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_roundtrips_snapshots() {
        let store = InMemoryJobStore::new();
        let mut job = MigrationJob::new();
        store.create(&job).await.unwrap();

        job.status = JobStatus::Running;
        job.processed = 12;
        store.update(&job).await.unwrap();

        let loaded = store.get(job.id).await.unwrap();
        assert_eq!(loaded.status, JobStatus::Running);
        assert_eq!(loaded.processed, 12);
    }

    #[tokio::test]
    async fn missing_job_is_a_typed_error() {
        let store = InMemoryJobStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PresswireError::JobNotFound(_)));
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
