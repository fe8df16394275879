use thiserror::Error;

/// Reasons a submitted batch is rejected before it is queued.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("ingest worker is not running")]
    WorkerUnavailable,
    #[error("store error: {0:#}")]
    Storage(#[from] anyhow::Error),
}
