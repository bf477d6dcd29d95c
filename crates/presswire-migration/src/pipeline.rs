//! End-to-end migration pipeline.
//!
//! Orchestrates the full flow for a single migration job:
//!   1. Resolve the target channel (lookup by name, create if absent)
//!   2. Count matching source records, mark the job running
//!   3. Fetch batches by ascending id with a strictly-greater-than cursor
//!   4. Transform each record into relational and/or vector form
//!   5. Write through the configured sinks (skipped entirely in dry-run)
//!   6. Update job counters + resumption cursor after every batch
//!
//! Per-record failures are isolated: they increment the failed counter and
//! are collected, but never abort the batch or the job. A whole-batch write
//! failure marks every record of that batch failed and moves on. Source
//! fetch failures are job-fatal; progress recorded so far is retained.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::job::{JobStatus, JobStore, MigrationJob};
use crate::models::DateRange;
use crate::normalize::ValidationPolicy;
use crate::sink::{RelationalSink, VectorSink};
use crate::source::ArticleSource;
use crate::transform::{TransformOutcome, Transformer};

// ── Run configuration ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub channel_name: String,
    pub batch_size: usize,
    pub date_range: DateRange,
    /// Stop after this many records even if the source has more.
    pub limit: Option<u64>,
    /// Count and transform, but never write.
    pub dry_run: bool,
    pub policy: ValidationPolicy,
    /// Resume strictly after this source id.
    pub resume_after: Option<String>,
    /// Throttle between batches to ease write pressure on the targets.
    pub batch_delay: Duration,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            channel_name: "imported-news".to_string(),
            batch_size: 50,
            date_range: DateRange::default(),
            limit: None,
            dry_run: false,
            policy: ValidationPolicy::default(),
            resume_after: None,
            batch_delay: Duration::from_millis(100),
        }
    }
}

/// Which writers this run is configured with. Either may be absent for
/// relational-only or vector-only migrations.
#[derive(Default)]
pub struct MigrationSinks {
    pub relational: Option<Arc<dyn RelationalSink>>,
    pub vector: Option<Arc<dyn VectorSink>>,
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total: u64,
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub relational_written: u64,
    pub vector_written: u64,
    pub errors: Vec<String>,
    pub last_source_id: Option<String>,
    pub duration_ms: u64,
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

/// Runs the end-to-end migration for one job.
///
/// The pipeline is non-destructive: per-record errors are logged and
/// collected while the loop continues. Only source connectivity failures
/// end the job early.
#[instrument(skip(opts, source, sinks, store), fields(channel = %opts.channel_name, dry_run = opts.dry_run))]
pub async fn run_migration(
    opts: MigrationOptions,
    source: Arc<dyn ArticleSource>,
    sinks: MigrationSinks,
    store: Arc<dyn JobStore>,
) -> MigrationReport {
    let t0 = std::time::Instant::now();
    let mut job = MigrationJob::new();
    if let Err(e) = store.create(&job).await {
        warn!("Job store create failed: {e}");
    }

    let transformer = Transformer::new(opts.policy);
    let mut errors: Vec<String> = Vec::new();
    let mut relational_written = 0u64;
    let mut vector_written = 0u64;

    // Channel resolution happens once and is cached for the whole run.
    // Dry-run must not create anything, and vector-only runs have no
    // channel table — both derive a stable id from the name instead.
    let channel_id = match &sinks.relational {
        Some(sink) if !opts.dry_run => match sink.ensure_channel(&opts.channel_name).await {
            Ok(id) => id,
            Err(e) => {
                let msg = format!("channel setup failed: {e}");
                warn!("{msg}");
                errors.push(msg.clone());
                return fail_job(job, msg, errors, relational_written, vector_written, &store, t0)
                    .await;
            }
        },
        _ => Uuid::new_v5(&Uuid::NAMESPACE_OID, opts.channel_name.as_bytes()),
    };

    if let Some(ref vector) = sinks.vector {
        if !opts.dry_run {
            if let Err(e) = vector.init().await {
                let msg = format!("vector collection init failed: {e}");
                warn!("{msg}");
                errors.push(msg.clone());
                return fail_job(job, msg, errors, relational_written, vector_written, &store, t0)
                    .await;
            }
        }
    }

    // An unreachable source is fatal before the first batch, the same way
    // a mid-run fetch failure is.
    match source.count(&opts.date_range).await {
        Ok(total) => job.total = total,
        Err(e) => {
            let msg = format!("source count failed: {e}");
            warn!("{msg}");
            errors.push(msg.clone());
            return fail_job(job, msg, errors, relational_written, vector_written, &store, t0)
                .await;
        }
    }

    job.status = JobStatus::Running;
    job.last_source_id = opts.resume_after.clone();
    if let Err(e) = store.update(&job).await {
        warn!("Job store update failed: {e}");
    }

    info!(job_id = %job.id, total = job.total, "Starting article migration");

    let mut cursor = opts.resume_after.clone();

    loop {
        if let Some(limit) = opts.limit {
            if job.processed >= limit {
                debug!(limit, "Record limit reached");
                break;
            }
        }
        let batch_size = match opts.limit {
            Some(limit) => ((limit - job.processed) as usize).min(opts.batch_size),
            None => opts.batch_size,
        };

        let batch = match source
            .fetch_batch(batch_size, cursor.as_deref(), &opts.date_range)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                // Job-fatal: no further batches, but progress stays recorded.
                let msg = format!("source fetch failed: {e}");
                warn!("{msg}");
                errors.push(msg.clone());
                return fail_job(job, msg, errors, relational_written, vector_written, &store, t0)
                    .await;
            }
        };

        if batch.is_empty() {
            break; // source exhausted
        }

        let batch_last_id = batch.last().map(|a| a.id.clone());
        let mut vector_points = Vec::new();

        for article in &batch {
            job.processed += 1;

            // Validation gates both outputs; a rejected record is a skip,
            // counted once no matter how many sinks are configured.
            match transformer.to_relational(article, channel_id) {
                Ok(TransformOutcome::Skipped { issues }) => {
                    debug!(id = %article.id, ?issues, "Record skipped by validation");
                    job.skipped += 1;
                    continue;
                }
                Ok(TransformOutcome::Ready(row)) => {
                    if let Some(ref sink) = sinks.relational {
                        if opts.dry_run {
                            relational_written += 1; // would-be write
                        } else {
                            match sink.insert_article(&row).await {
                                Ok(_) => relational_written += 1,
                                Err(e) => {
                                    let msg =
                                        format!("article insert failed for {}: {e}", article.id);
                                    warn!("{msg}");
                                    errors.push(msg);
                                    job.failed += 1;
                                    continue;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    let msg = format!("transform failed for {}: {e}", article.id);
                    warn!("{msg}");
                    errors.push(msg);
                    job.failed += 1;
                    continue;
                }
            }

            if sinks.vector.is_some() {
                match transformer.to_vector_point(article, channel_id) {
                    Ok(TransformOutcome::Ready(point)) => vector_points.push(point),
                    Ok(TransformOutcome::Skipped { .. }) => {} // counted above
                    Err(e) => {
                        let msg = format!("vector transform failed for {}: {e}", article.id);
                        warn!("{msg}");
                        errors.push(msg);
                        job.failed += 1;
                    }
                }
            }
        }

        // One upsert per batch. A whole-batch write failure marks every
        // point of the batch failed and the loop moves to the next one.
        if let Some(ref vector) = sinks.vector {
            if !vector_points.is_empty() {
                if opts.dry_run {
                    vector_written += vector_points.len() as u64;
                } else {
                    let point_count = vector_points.len() as u64;
                    match vector.upsert_batch(vector_points).await {
                        Ok(written) => vector_written += written as u64,
                        Err(e) => {
                            let msg = format!("vector batch upsert failed: {e}");
                            warn!("{msg}");
                            errors.push(msg);
                            job.failed += point_count;
                        }
                    }
                }
            }
        }

        // Cursor advances to the last id of the fetched batch even when
        // records in it were skipped or failed — resumption must never
        // re-read them.
        if let Some(last_id) = batch_last_id {
            job.last_source_id = Some(last_id);
            cursor = job.last_source_id.clone();
        }
        if let Err(e) = store.update(&job).await {
            warn!("Job store update failed: {e}");
        }

        if !opts.batch_delay.is_zero() {
            tokio::time::sleep(opts.batch_delay).await;
        }
    }

    job.status = JobStatus::Completed;
    job.completed_at = Some(Utc::now());
    if let Err(e) = store.update(&job).await {
        warn!("Job store update failed: {e}");
    }

    info!(
        job_id = %job.id,
        processed = job.processed,
        skipped   = job.skipped,
        failed    = job.failed,
        relational_written,
        vector_written,
        duration_ms = t0.elapsed().as_millis() as u64,
        "Migration complete"
    );

    report(job, errors, relational_written, vector_written, t0)
}

async fn fail_job(
    mut job: MigrationJob,
    message: String,
    errors: Vec<String>,
    relational_written: u64,
    vector_written: u64,
    store: &Arc<dyn JobStore>,
    t0: std::time::Instant,
) -> MigrationReport {
    job.status = JobStatus::Failed;
    job.error = Some(message);
    job.completed_at = Some(Utc::now());
    if let Err(e) = store.update(&job).await {
        warn!("Job store update failed: {e}");
    }
    report(job, errors, relational_written, vector_written, t0)
}

fn report(
    job: MigrationJob,
    errors: Vec<String>,
    relational_written: u64,
    vector_written: u64,
    t0: std::time::Instant,
) -> MigrationReport {
    MigrationReport {
        job_id: job.id,
        status: job.status,
        total: job.total,
        processed: job.processed,
        skipped: job.skipped,
        failed: job.failed,
        relational_written,
        vector_written,
        errors,
        last_source_id: job.last_source_id,
        duration_ms: t0.elapsed().as_millis() as u64,
    }
}
