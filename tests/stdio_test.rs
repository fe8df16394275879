mod common;

use common::test_state;
use motorskill_lib::stdio;
use serde_json::{json, Value};

async fn call(state: &motorskill_lib::AppState, request: Value) -> Value {
    let response = stdio::handle_line(state, &request.to_string()).await;
    serde_json::to_value(response).expect("encode response")
}

#[tokio::test]
async fn test_session_round_trip_over_json_lines() {
    let (_dir, state) = test_state(50, 50);

    let created = call(
        &state,
        json!({"id": 1, "command": "create_session", "args": {"participantId": "p9"}}),
    )
    .await;
    assert_eq!(created["ok"], true);
    assert_eq!(created["id"], 1);
    let session_id = created["data"]["id"].as_str().expect("session id").to_string();

    let ack = call(
        &state,
        json!({
            "command": "submit_attempts",
            "args": {
                "sessionId": session_id,
                "attempts": [{
                    "round": 1,
                    "attemptId": "a1",
                    "spawn_t_ms": 0.0,
                    "target": {"x": 0.5, "y": 0.5, "radius": 0.05},
                    "click": {"clicked": true, "hit": true, "t_ms": 420.0}
                }]
            }
        }),
    )
    .await;
    assert_eq!(ack["ok"], true);
    assert_eq!(ack["data"]["accepted"], 1);
    assert_eq!(ack["data"]["participantId"], "p9");

    call(&state, json!({"command": "flush_ingest"})).await;

    let attempts = call(
        &state,
        json!({"command": "get_attempts", "args": {"sessionId": session_id, "round": 1}}),
    )
    .await;
    let stored = &attempts["data"][0];
    assert_eq!(stored["features"]["quality"], "basic");
    assert_eq!(stored["features"]["timing"]["reactionTimeMs"], 420.0);
}

#[tokio::test]
async fn test_errors_are_reported_not_raised() {
    let (_dir, state) = test_state(50, 50);

    let unknown = call(&state, json!({"command": "explode"})).await;
    assert_eq!(unknown["ok"], false);
    assert!(unknown["error"].as_str().expect("message").contains("unknown command"));

    let bad_round = call(
        &state,
        json!({"command": "get_samples", "args": {"sessionId": "s", "round": 7}}),
    )
    .await;
    assert_eq!(bad_round["ok"], false);

    let missing_session = call(
        &state,
        json!({"command": "submit_samples", "args": {"sessionId": "ghost", "samples": [
            {"round": 1, "t_ms": 0.0, "x": 0.1, "y": 0.1}
        ]}}),
    )
    .await;
    assert_eq!(missing_session["ok"], false);
    assert!(missing_session["error"]
        .as_str()
        .expect("message")
        .contains("unknown session"));

    let garbage = stdio::handle_line(&state, "not json").await;
    assert!(!garbage.ok);
}

#[tokio::test]
async fn test_updated_settings_apply_to_later_batches() {
    let (_dir, state) = test_state(50, 50);

    let current = call(&state, json!({"command": "get_settings"})).await;
    assert_eq!(current["data"]["sampleBucketCapacity"], 50);

    let updated = call(
        &state,
        json!({"command": "update_settings", "args": {"settings": {"sampleBucketCapacity": 2}}}),
    )
    .await;
    assert_eq!(updated["ok"], true);
    assert_eq!(updated["data"]["sampleBucketCapacity"], 2);
    assert_eq!(updated["data"]["featureVersion"], "kinematics-v1");

    let session = call(&state, json!({"command": "create_session", "args": {}})).await;
    let session_id = session["data"]["id"].as_str().expect("session id").to_string();
    let samples: Vec<Value> = (0..5)
        .map(|i| json!({"round": 1, "t_ms": f64::from(i), "x": 0.0, "y": 0.0}))
        .collect();
    let ack = call(
        &state,
        json!({"command": "submit_samples", "args": {"sessionId": session_id, "samples": samples}}),
    )
    .await;
    assert_eq!(ack["ok"], true);
    call(&state, json!({"command": "flush_ingest"})).await;

    let buckets = state.db.sample_buckets(&session_id).await.expect("buckets");
    assert_eq!(buckets.len(), 3);
}
