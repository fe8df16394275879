//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use motorskill_lib::{
    db::{
        models::{Attempt, Click, PointerSample, Round, SessionInput, Target},
        Database,
    },
    settings::{EngineSettings, SettingsStore},
    AppState,
};
use tempfile::TempDir;

/// App state over a throwaway database with small bucket capacities.
pub fn test_state(sample_capacity: usize, attempt_capacity: usize) -> (TempDir, AppState) {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::new(dir.path().join("test.sqlite3")).expect("open database");
    let settings = SettingsStore::in_memory(EngineSettings {
        sample_bucket_capacity: sample_capacity,
        attempt_bucket_capacity: attempt_capacity,
        ..EngineSettings::default()
    });
    (dir, AppState::with_parts(db, settings))
}

pub async fn new_session(state: &AppState, participant: &str) -> String {
    state
        .db
        .create_session(SessionInput {
            participant_id: Some(participant.to_string()),
            ..SessionInput::default()
        })
        .await
        .expect("create session")
        .id
}

pub fn round(n: u8) -> Round {
    Round::try_from(n).expect("valid round")
}

pub fn sample(round_no: u8, t_ms: f64, x: f64, y: f64) -> PointerSample {
    PointerSample {
        round: round(round_no),
        t_ms,
        x,
        y,
        is_down: false,
        pointer_type: "mouse".to_string(),
    }
}

/// Five samples moving in a straight line from (0,0) to (0.1,0) over 100ms.
pub fn straight_line(round_no: u8, start_ms: f64) -> Vec<PointerSample> {
    (0..5)
        .map(|i| sample(round_no, start_ms + f64::from(i) * 25.0, f64::from(i) * 0.025, 0.0))
        .collect()
}

pub fn target() -> Target {
    Target {
        x: 0.1,
        y: 0.0,
        radius: 0.05,
    }
}

pub fn clicked_attempt(round_no: u8, id: &str, spawn: f64, click: f64, hit: bool) -> Attempt {
    Attempt {
        round: round(round_no),
        attempt_id: id.to_string(),
        bubble_id: None,
        spawn_t_ms: spawn,
        target: target(),
        click: Click {
            clicked: true,
            hit,
            miss_type: if hit { None } else { Some("outside".to_string()) },
            t_ms: Some(click),
            x: Some(0.1),
            y: Some(0.0),
            rt_ms: None,
        },
    }
}

pub fn missed_attempt(round_no: u8, id: &str, spawn: f64) -> Attempt {
    Attempt {
        round: round(round_no),
        attempt_id: id.to_string(),
        bubble_id: None,
        spawn_t_ms: spawn,
        target: target(),
        click: Click {
            miss_type: Some("timeout".to_string()),
            ..Click::default()
        },
    }
}

/// `hits` clicked hits followed by `misses` timeouts, 200ms apart.
pub fn attempts(round_no: u8, hits: usize, misses: usize) -> Vec<Attempt> {
    let mut out = Vec::with_capacity(hits + misses);
    for i in 0..hits {
        let spawn = i as f64 * 200.0;
        out.push(clicked_attempt(round_no, &format!("r{round_no}-hit-{i}"), spawn, spawn + 100.0, true));
    }
    for i in 0..misses {
        let spawn = (hits + i) as f64 * 200.0;
        out.push(missed_attempt(round_no, &format!("r{round_no}-miss-{i}"), spawn));
    }
    out
}
