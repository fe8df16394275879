use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    db::{
        models::{Attempt, PointerSample},
        Database,
    },
    metrics::{IngestMetrics, JobKind},
    settings::SettingsStore,
};

use super::{
    error::IngestError,
    worker::{ingest_loop, IngestJob, WorkerContext},
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBatch {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub samples: Vec<PointerSample>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptBatch {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

/// Returned as soon as a batch is validated and queued. Processing happens
/// later and its failures surface only through logs and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub session_id: String,
    pub participant_id: Option<String>,
    pub accepted: usize,
}

/// Front door of the ingestion path: validates batches, checks the session,
/// acknowledges and hands the work to the background worker.
#[derive(Clone)]
pub struct IngestController {
    sender: mpsc::UnboundedSender<IngestJob>,
    db: Database,
    metrics: IngestMetrics,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel_token: CancellationToken,
}

impl IngestController {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(db: Database, settings: Arc<SettingsStore>, metrics: IngestMetrics) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let ctx = WorkerContext {
            db: db.clone(),
            settings,
            metrics: metrics.clone(),
        };
        let handle = tokio::spawn(ingest_loop(ctx, receiver, cancel_token.clone()));

        Self {
            sender,
            db,
            metrics,
            handle: Arc::new(Mutex::new(Some(handle))),
            cancel_token,
        }
    }

    pub async fn submit_samples(&self, batch: SampleBatch) -> Result<Ack, IngestError> {
        require_session_id(&batch.session_id)?;
        validate_samples(&batch.samples)?;
        let participant_id = self.check_session(&batch.session_id, batch.user_id.as_deref()).await?;

        let accepted = batch.samples.len();
        self.enqueue(IngestJob::StoreSamples {
            job_id: Uuid::new_v4().to_string(),
            session_id: batch.session_id.clone(),
            samples: batch.samples,
        })?;
        self.metrics.record_accepted(JobKind::Samples, accepted).await;

        Ok(Ack {
            session_id: batch.session_id,
            participant_id,
            accepted,
        })
    }

    pub async fn submit_attempts(&self, batch: AttemptBatch) -> Result<Ack, IngestError> {
        require_session_id(&batch.session_id)?;
        validate_attempts(&batch.attempts)?;
        let participant_id = self.check_session(&batch.session_id, batch.user_id.as_deref()).await?;

        let accepted = batch.attempts.len();
        self.enqueue(IngestJob::EnrichAttempts {
            job_id: Uuid::new_v4().to_string(),
            session_id: batch.session_id.clone(),
            attempts: batch.attempts,
        })?;
        self.metrics.record_accepted(JobKind::Attempts, accepted).await;

        Ok(Ack {
            session_id: batch.session_id,
            participant_id,
            accepted,
        })
    }

    /// Wait until every job queued before this call has been processed.
    pub async fn flush(&self) -> Result<(), IngestError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(IngestJob::Flush(reply_tx))?;
        reply_rx.await.map_err(|_| IngestError::WorkerUnavailable)
    }

    /// Stop accepting work, let the worker drain its queue and join it.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.cancel_token.cancel();

        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            handle.await.context("ingest worker task failed to join")?;
            log_info!("ingest worker stopped");
        }
        Ok(())
    }

    fn enqueue(&self, job: IngestJob) -> Result<(), IngestError> {
        if self.cancel_token.is_cancelled() {
            return Err(IngestError::WorkerUnavailable);
        }
        self.sender
            .send(job)
            .map_err(|_| IngestError::WorkerUnavailable)
    }

    /// Returns the participant registered for the session.
    async fn check_session(
        &self,
        session_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<String>, IngestError> {
        if !self.db.session_exists(session_id).await? {
            return Err(IngestError::UnknownSession(session_id.to_string()));
        }

        let participant_id = self.db.session_user_id(session_id).await?;
        if let (Some(claimed), Some(registered)) = (user_id, participant_id.as_deref()) {
            if claimed != registered {
                log_warn!(
                    "batch for session {session_id} claims user {claimed}, session belongs to {registered}"
                );
            }
        }
        Ok(participant_id.or_else(|| user_id.map(str::to_string)))
    }
}

fn require_session_id(session_id: &str) -> Result<(), IngestError> {
    if session_id.trim().is_empty() {
        return Err(IngestError::Validation("sessionId is required".into()));
    }
    Ok(())
}

fn validate_samples(samples: &[PointerSample]) -> Result<(), IngestError> {
    if samples.is_empty() {
        return Err(IngestError::Validation("samples must not be empty".into()));
    }
    if let Some(index) = samples.iter().position(|sample| !sample.is_finite()) {
        return Err(IngestError::Validation(format!(
            "sample {index} has a non-finite coordinate or timestamp"
        )));
    }
    Ok(())
}

fn validate_attempts(attempts: &[Attempt]) -> Result<(), IngestError> {
    if attempts.is_empty() {
        return Err(IngestError::Validation("attempts must not be empty".into()));
    }

    let mut seen = HashSet::with_capacity(attempts.len());
    for attempt in attempts {
        let id = attempt.attempt_id.as_str();
        if id.trim().is_empty() {
            return Err(IngestError::Validation("attemptId is required".into()));
        }
        if !seen.insert(id) {
            return Err(IngestError::Validation(format!("duplicate attemptId {id}")));
        }
        let target = &attempt.target;
        let finite = [attempt.spawn_t_ms, target.x, target.y, target.radius]
            .iter()
            .all(|value| value.is_finite());
        if !finite || target.radius < 0.0 {
            return Err(IngestError::Validation(format!(
                "attempt {id} has an invalid spawn time or target"
            )));
        }
    }
    Ok(())
}
