use crate::{
    db::models::{EnrichedAttempt, PointerSample, Round, Session, SessionInput},
    metrics::MetricsSnapshot,
    AppState,
};

use super::{Ack, AttemptBatch, SampleBatch};

pub async fn create_session(state: &AppState, input: SessionInput) -> Result<Session, String> {
    state
        .db
        .create_session(input)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_session(state: &AppState, session_id: String) -> Result<Option<Session>, String> {
    state
        .db
        .get_session(&session_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_session(state: &AppState, session_id: String) -> Result<bool, String> {
    state
        .db
        .delete_session(&session_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn submit_samples(state: &AppState, batch: SampleBatch) -> Result<Ack, String> {
    state
        .ingest
        .submit_samples(batch)
        .await
        .map_err(|e| e.to_string())
}

pub async fn submit_attempts(state: &AppState, batch: AttemptBatch) -> Result<Ack, String> {
    state
        .ingest
        .submit_attempts(batch)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_samples(
    state: &AppState,
    session_id: String,
    round: Option<Round>,
) -> Result<Vec<PointerSample>, String> {
    state
        .db
        .get_samples(&session_id, round)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_attempts(
    state: &AppState,
    session_id: String,
    round: Option<Round>,
) -> Result<Vec<EnrichedAttempt>, String> {
    state
        .db
        .get_attempts(&session_id, round)
        .await
        .map_err(|e| e.to_string())
}

pub async fn flush_ingest(state: &AppState) -> Result<(), String> {
    state.ingest.flush().await.map_err(|e| e.to_string())
}

pub async fn get_ingest_metrics(state: &AppState) -> Result<MetricsSnapshot, String> {
    Ok(state.metrics.get_snapshot().await)
}
