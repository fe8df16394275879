mod types;

pub use types::{JobKind, JobOutcome, JobStatus, MetricsSnapshot};

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_RECENT_JOBS: usize = 20;

/// Counters for the ingestion path. Background failures never reach the
/// submitter, so this is where they surface.
pub struct IngestMetrics {
    inner: Arc<Mutex<MetricsState>>,
}

#[derive(Default)]
struct MetricsState {
    totals: MetricsSnapshot,
    recent_jobs: VecDeque<JobOutcome>,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::default())),
        }
    }

    pub async fn record_accepted(&self, kind: JobKind, items: usize) {
        let mut state = self.inner.lock().await;
        match kind {
            JobKind::Samples => {
                state.totals.sample_batches_accepted += 1;
                state.totals.samples_accepted += items as u64;
            }
            JobKind::Attempts => {
                state.totals.attempt_batches_accepted += 1;
                state.totals.attempts_accepted += items as u64;
            }
        }
    }

    pub async fn record_job(&self, outcome: JobOutcome) {
        let mut state = self.inner.lock().await;

        match outcome.status {
            JobStatus::Completed => state.totals.jobs_completed += 1,
            JobStatus::Dropped => state.totals.jobs_dropped += 1,
            JobStatus::Failed => state.totals.jobs_failed += 1,
        }
        state.totals.attempts_full += outcome.full_features as u64;
        state.totals.attempts_basic += outcome.basic_features as u64;

        state.recent_jobs.push_back(outcome);
        if state.recent_jobs.len() > MAX_RECENT_JOBS {
            state.recent_jobs.pop_front();
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let state = self.inner.lock().await;
        MetricsSnapshot {
            recent_jobs: state.recent_jobs.iter().cloned().collect(),
            ..state.totals.clone()
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = MetricsState::default();
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IngestMetrics {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
