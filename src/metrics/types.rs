use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobKind {
    Samples,
    Attempts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Completed,
    /// Session vanished between acknowledgement and processing
    Dropped,
    Failed,
}

/// Outcome of one background ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_id: String,
    pub kind: JobKind,
    pub session_id: String,
    pub status: JobStatus,
    pub items: usize,
    pub full_features: usize,
    pub basic_features: usize,
    pub buckets_written: usize,
    pub elapsed_ms: u64,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub sample_batches_accepted: u64,
    pub attempt_batches_accepted: u64,
    pub samples_accepted: u64,
    pub attempts_accepted: u64,
    pub jobs_completed: u64,
    pub jobs_dropped: u64,
    pub jobs_failed: u64,
    pub attempts_full: u64,
    pub attempts_basic: u64,
    pub recent_jobs: Vec<JobOutcome>,
}
