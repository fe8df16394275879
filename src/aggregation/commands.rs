use chrono::Utc;
use serde::Deserialize;

use crate::{
    db::models::{Round, RoundSummary, SessionLabel, SessionSummary},
    AppState,
};

use super::{load_round_features, load_session_features};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummaryRequest {
    pub session_id: String,
    #[serde(default)]
    pub participant_id: Option<String>,
    pub round: Round,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryRequest {
    pub session_id: String,
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub label: Option<SessionLabel>,
}

/// Falls back to the participant registered on the session when the caller
/// did not name one.
async fn resolve_participant(
    state: &AppState,
    session_id: &str,
    participant_id: Option<String>,
) -> Result<Option<String>, String> {
    if !state
        .db
        .session_exists(session_id)
        .await
        .map_err(|e| e.to_string())?
    {
        return Err(format!("unknown session: {session_id}"));
    }
    match participant_id {
        Some(id) => Ok(Some(id)),
        None => state
            .db
            .session_user_id(session_id)
            .await
            .map_err(|e| e.to_string()),
    }
}

pub async fn compute_round_summary(
    state: &AppState,
    request: RoundSummaryRequest,
) -> Result<RoundSummary, String> {
    let participant_id =
        resolve_participant(state, &request.session_id, request.participant_id).await?;

    let features = load_round_features(&state.db, &request.session_id, request.round)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            format!(
                "no attempts found for session {} round {}",
                request.session_id, request.round
            )
        })?;

    let summary = RoundSummary {
        session_id: request.session_id,
        participant_id,
        round: request.round,
        counts: features.counts,
        features: features.features,
        feature_version: state.settings.snapshot().feature_version,
        computed_at: Utc::now(),
    };

    state
        .db
        .upsert_round_summary(&summary)
        .await
        .map_err(|e| e.to_string())?;
    Ok(summary)
}

pub async fn compute_session_summary(
    state: &AppState,
    request: SessionSummaryRequest,
) -> Result<SessionSummary, String> {
    let participant_id =
        resolve_participant(state, &request.session_id, request.participant_id).await?;

    let features = load_session_features(&state.db, &request.session_id)
        .await
        .map_err(|e| e.to_string())?;

    let now = Utc::now();
    let summary = SessionSummary {
        session_id: request.session_id,
        participant_id,
        features,
        feature_version: state.settings.snapshot().feature_version,
        label: request.label,
        computed_at: now,
        updated_at: now,
    };

    state
        .db
        .upsert_session_summary(&summary)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_round_summary(
    state: &AppState,
    session_id: String,
    round: Round,
) -> Result<Option<RoundSummary>, String> {
    state
        .db
        .get_round_summary(&session_id, round)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_session_summary(
    state: &AppState,
    session_id: String,
) -> Result<Option<SessionSummary>, String> {
    state
        .db
        .get_session_summary(&session_id)
        .await
        .map_err(|e| e.to_string())
}
