use chrono::Utc;

use crate::{
    db::models::{SessionLabel, SessionSummary, TrainingPage, TrainingQuery},
    AppState,
};

pub async fn update_session_label(
    state: &AppState,
    session_id: String,
    label: SessionLabel,
) -> Result<SessionSummary, String> {
    state
        .db
        .update_session_label(&session_id, label, Utc::now())
        .await
        .map_err(|e| e.to_string())
}

pub async fn query_training_data(
    state: &AppState,
    query: TrainingQuery,
) -> Result<TrainingPage, String> {
    state
        .db
        .query_training_data(query)
        .await
        .map_err(|e| e.to_string())
}
