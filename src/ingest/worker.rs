use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    db::{
        models::{Attempt, PointerSample},
        Database, UnknownSession,
    },
    features::FeatureExtractor,
    metrics::{IngestMetrics, JobKind, JobOutcome, JobStatus},
    settings::SettingsStore,
};

use super::pipeline;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub enum IngestJob {
    StoreSamples {
        job_id: String,
        session_id: String,
        samples: Vec<PointerSample>,
    },
    EnrichAttempts {
        job_id: String,
        session_id: String,
        attempts: Vec<Attempt>,
    },
    /// Answered once every job queued before it has been processed.
    Flush(oneshot::Sender<()>),
}

/// What a job did, before it is turned into a [`JobOutcome`].
#[derive(Debug, Default)]
struct JobReport {
    full_features: usize,
    basic_features: usize,
    buckets_written: usize,
}

pub struct WorkerContext {
    pub db: Database,
    pub settings: Arc<SettingsStore>,
    pub metrics: IngestMetrics,
}

pub async fn ingest_loop(
    ctx: WorkerContext,
    mut jobs: mpsc::UnboundedReceiver<IngestJob>,
    cancel_token: CancellationToken,
) {
    log_info!("ingest worker started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                // Acknowledged batches still get written before exit.
                jobs.close();
                while let Some(job) = jobs.recv().await {
                    handle_job(&ctx, job).await;
                }
                log_info!("ingest worker shutting down");
                break;
            }
            job = jobs.recv() => match job {
                Some(job) => handle_job(&ctx, job).await,
                None => {
                    log_info!("ingest queue closed, worker exiting");
                    break;
                }
            },
        }
    }
}

/// Runs one job to completion. Jobs are not timed out: a store write that has
/// reached the connection thread commits regardless, so an abandoned wait
/// would report a failure for data that landed.
async fn handle_job(ctx: &WorkerContext, job: IngestJob) {
    let started = Instant::now();
    let (job_id, kind, session_id, items, result) = match job {
        IngestJob::Flush(reply) => {
            let _ = reply.send(());
            return;
        }
        IngestJob::StoreSamples {
            job_id,
            session_id,
            samples,
        } => {
            let items = samples.len();
            let result = store_samples(ctx, &session_id, samples).await;
            (job_id, JobKind::Samples, session_id, items, result)
        }
        IngestJob::EnrichAttempts {
            job_id,
            session_id,
            attempts,
        } => {
            let items = attempts.len();
            let result = enrich_attempts(ctx, &session_id, attempts).await;
            (job_id, JobKind::Attempts, session_id, items, result)
        }
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (status, report, error) = match result {
        Ok(report) => {
            log_info!(
                "job {job_id} ({kind:?}) session {session_id}: {items} items, {} full, {} basic, {} buckets in {elapsed_ms}ms",
                report.full_features,
                report.basic_features,
                report.buckets_written
            );
            (JobStatus::Completed, report, None)
        }
        Err(err) if err.downcast_ref::<UnknownSession>().is_some() => {
            log_warn!("job {job_id} ({kind:?}) dropped: session {session_id} no longer exists");
            (JobStatus::Dropped, JobReport::default(), Some(err.to_string()))
        }
        Err(err) => {
            log_error!("job {job_id} ({kind:?}) failed for session {session_id}: {err:?}");
            (JobStatus::Failed, JobReport::default(), Some(format!("{err:#}")))
        }
    };

    ctx.metrics
        .record_job(JobOutcome {
            job_id,
            kind,
            session_id,
            status,
            items,
            full_features: report.full_features,
            basic_features: report.basic_features,
            buckets_written: report.buckets_written,
            elapsed_ms,
            error,
            finished_at: Utc::now(),
        })
        .await;
}

async fn store_samples(
    ctx: &WorkerContext,
    session_id: &str,
    samples: Vec<PointerSample>,
) -> Result<JobReport> {
    let capacity = ctx.settings.snapshot().sample_bucket_capacity;
    let outcome = ctx.db.append_samples(session_id, samples, capacity).await?;
    Ok(JobReport {
        buckets_written: outcome.buckets_written,
        ..JobReport::default()
    })
}

async fn enrich_attempts(
    ctx: &WorkerContext,
    session_id: &str,
    attempts: Vec<Attempt>,
) -> Result<JobReport> {
    let settings = ctx.settings.snapshot();
    let extractor = FeatureExtractor::new(settings.extraction);
    let report = pipeline::enrich(
        &ctx.db,
        &extractor,
        session_id,
        attempts,
        settings.attempt_bucket_capacity,
    )
    .await?;

    Ok(JobReport {
        full_features: report.full,
        basic_features: report.basic,
        buckets_written: report.append.map_or(0, |outcome| outcome.buckets_written),
    })
}
