mod common;

use common::{attempts, new_session, round, test_state};
use motorskill_lib::{
    aggregation::{
        self,
        commands::{compute_round_summary, compute_session_summary, RoundSummaryRequest, SessionSummaryRequest},
    },
    db::models::{SessionLabel, TrainingQuery},
    ingest::{commands as ingest, AttemptBatch, IngestError},
    labels::commands as labels,
    AppState,
};

async fn ingest_attempts(state: &AppState, session_id: &str, round_no: u8, hits: usize, misses: usize) {
    ingest::submit_attempts(
        state,
        AttemptBatch {
            session_id: session_id.to_string(),
            user_id: None,
            attempts: attempts(round_no, hits, misses),
        },
    )
    .await
    .expect("ack");
    ingest::flush_ingest(state).await.expect("flush");
}

#[tokio::test]
async fn test_round_counts_for_ten_attempts() {
    let (_dir, state) = test_state(50, 4);
    let session_id = new_session(&state, "p1").await;
    ingest_attempts(&state, &session_id, 1, 6, 4).await;

    let summary = compute_round_summary(
        &state,
        RoundSummaryRequest {
            session_id: session_id.clone(),
            participant_id: None,
            round: round(1),
        },
    )
    .await
    .expect("summary");

    assert_eq!(summary.counts.n_targets, 10);
    assert_eq!(summary.counts.n_hits, 6);
    assert_eq!(summary.counts.n_misses, 4);
    assert!((summary.counts.hit_rate - 0.6).abs() < 1e-12);
    assert_eq!(summary.participant_id.as_deref(), Some("p1"));
    assert_eq!(summary.feature_version, "kinematics-v1");

    let stored = state
        .db
        .get_round_summary(&session_id, round(1))
        .await
        .expect("get")
        .expect("stored summary");
    assert_eq!(stored.counts, summary.counts);
    assert_eq!(
        stored.features.keys().collect::<Vec<_>>(),
        summary.features.keys().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_round_features_are_idempotent() {
    let (_dir, state) = test_state(50, 4);
    let session_id = new_session(&state, "p1").await;
    ingest_attempts(&state, &session_id, 2, 3, 2).await;

    let first = aggregation::load_round_features(&state.db, &session_id, round(2))
        .await
        .expect("first");
    let second = aggregation::load_round_features(&state.db, &session_id, round(2))
        .await
        .expect("second");
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_round_without_attempts_is_not_computed() {
    let (_dir, state) = test_state(50, 4);
    let session_id = new_session(&state, "p1").await;
    ingest_attempts(&state, &session_id, 1, 1, 0).await;

    let features = aggregation::load_round_features(&state.db, &session_id, round(2))
        .await
        .expect("load");
    assert!(features.is_none());

    let err = compute_round_summary(
        &state,
        RoundSummaryRequest {
            session_id: session_id.clone(),
            participant_id: None,
            round: round(2),
        },
    )
    .await
    .expect_err("no attempts");
    assert!(err.contains("no attempts found"));
    assert!(state
        .db
        .get_round_summary(&session_id, round(2))
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn test_session_trend_skips_missing_round() {
    let (_dir, state) = test_state(50, 4);
    let session_id = new_session(&state, "p1").await;
    ingest_attempts(&state, &session_id, 1, 2, 2).await;
    ingest_attempts(&state, &session_id, 3, 3, 1).await;

    let summary = compute_session_summary(
        &state,
        SessionSummaryRequest {
            session_id,
            participant_id: Some("override".into()),
            label: None,
        },
    )
    .await
    .expect("summary");

    let trend = summary
        .features
        .get("hitRate_trend")
        .copied()
        .flatten()
        .expect("hit rate trend");
    assert!((trend - 0.25).abs() < 1e-12);
    assert!(summary.features.keys().all(|key| !key.starts_with("r2_")));
    assert_eq!(summary.features.get("r1_hitRate"), Some(&Some(0.5)));
    assert_eq!(summary.features.get("r3_hitRate"), Some(&Some(0.75)));
    // every attempt degraded to basic features, so there is no throughput to trend
    assert!(!summary.features.contains_key("throughput_trend"));
    assert_eq!(summary.participant_id.as_deref(), Some("override"));
    assert!(summary.label.is_none());
}

#[tokio::test]
async fn test_unknown_session_is_rejected_without_writes() {
    let (_dir, state) = test_state(50, 4);

    let result = state
        .ingest
        .submit_attempts(AttemptBatch {
            session_id: "no-such-session".into(),
            user_id: Some("p1".into()),
            attempts: attempts(1, 2, 1),
        })
        .await;
    assert!(matches!(result, Err(IngestError::UnknownSession(id)) if id == "no-such-session"));

    state.ingest.flush().await.expect("flush");
    assert!(state
        .db
        .attempt_buckets("no-such-session")
        .await
        .expect("buckets")
        .is_empty());

    let metrics = state.metrics.get_snapshot().await;
    assert_eq!(metrics.attempt_batches_accepted, 0);
    assert!(metrics.recent_jobs.is_empty());
}

#[tokio::test]
async fn test_labels_survive_recompute_and_filter_training_data() {
    let (_dir, state) = test_state(50, 4);
    let labelled = new_session(&state, "p1").await;
    let unlabelled = new_session(&state, "p2").await;
    ingest_attempts(&state, &labelled, 1, 2, 1).await;
    ingest_attempts(&state, &unlabelled, 1, 1, 1).await;

    let label = SessionLabel {
        level: Some("high".into()),
        score: Some(0.9),
        source: Some("clinician".into()),
        version: Some("v1".into()),
    };
    compute_session_summary(
        &state,
        SessionSummaryRequest {
            session_id: labelled.clone(),
            participant_id: None,
            label: Some(label.clone()),
        },
    )
    .await
    .expect("labelled summary");
    compute_session_summary(
        &state,
        SessionSummaryRequest {
            session_id: unlabelled.clone(),
            participant_id: None,
            label: None,
        },
    )
    .await
    .expect("unlabelled summary");

    // recomputing without a label keeps the stored one
    let recomputed = compute_session_summary(
        &state,
        SessionSummaryRequest {
            session_id: labelled.clone(),
            participant_id: None,
            label: None,
        },
    )
    .await
    .expect("recompute");
    assert_eq!(recomputed.label, Some(label));

    let updated = labels::update_session_label(
        &state,
        unlabelled.clone(),
        SessionLabel {
            level: Some("low".into()),
            ..SessionLabel::default()
        },
    )
    .await
    .expect("update label");
    assert_eq!(
        updated.label.and_then(|l| l.level).as_deref(),
        Some("low")
    );

    let high = labels::query_training_data(
        &state,
        TrainingQuery {
            label_level: Some("high".into()),
            ..TrainingQuery::default()
        },
    )
    .await
    .expect("query");
    assert_eq!(high.total, 1);
    assert_eq!(high.rows[0].session_id, labelled);
    assert_eq!(high.limit, 50);

    let by_participant = labels::query_training_data(
        &state,
        TrainingQuery {
            participant_id: Some("p2".into()),
            limit: Some(10_000),
            ..TrainingQuery::default()
        },
    )
    .await
    .expect("query");
    assert_eq!(by_participant.total, 1);
    assert_eq!(by_participant.limit, 500);
    assert_eq!(by_participant.rows[0].session_id, unlabelled);
}

#[tokio::test]
async fn test_update_label_requires_existing_summary() {
    let (_dir, state) = test_state(50, 4);
    let session_id = new_session(&state, "p1").await;

    let err = labels::update_session_label(&state, session_id, SessionLabel::default())
        .await
        .expect_err("no summary yet");
    assert!(err.contains("not found"));
}
