//! Overshoot detection on the distance-to-target profile.
//!
//! Three detectors run independently and the largest count wins. The
//! thresholds are heuristics; keep them in sync with the labelled data the
//! downstream classifier was trained on.

use crate::db::models::{PointerSample, Target};

use super::config::ExtractionConfig;

/// Approach followed by retreat at index `i` (deltas `d[i-1]-d[i-2]` and `d[i]-d[i-1]`).
fn is_reversal(distances: &[f64], i: usize, delta: f64) -> bool {
    let before = distances[i - 1] - distances[i - 2];
    let after = distances[i] - distances[i - 1];
    before < -delta && after > delta
}

/// Reversals anywhere in the path, counted only inside the gate.
pub fn global_reversals(distances: &[f64], gate: f64, config: &ExtractionConfig) -> u32 {
    (2..distances.len())
        .filter(|&i| is_reversal(distances, i, config.reversal_delta) && distances[i] < gate)
        .count() as u32
}

/// Ungated reversals within the trailing part of the path.
pub fn final_approach_reversals(distances: &[f64], config: &ExtractionConfig) -> u32 {
    let n = distances.len();
    let start = ((n as f64) * (1.0 - config.final_approach_fraction)).floor() as usize;
    let tail = &distances[start.min(n)..];
    if tail.len() <= config.final_approach_min_samples {
        return 0;
    }

    (2..tail.len())
        .filter(|&i| is_reversal(tail, i, config.reversal_delta))
        .count() as u32
}

/// Samples inside the gate where the x or y step changes sign, with both
/// steps larger than `oscillation_step`.
pub fn positional_oscillations(
    samples: &[PointerSample],
    distances: &[f64],
    gate: f64,
    config: &ExtractionConfig,
) -> u32 {
    let step = config.oscillation_step;
    let flips = |before: f64, after: f64| {
        before.signum() != after.signum() && before.abs() > step && after.abs() > step
    };

    (1..samples.len().saturating_sub(1))
        .filter(|&i| distances[i] < gate)
        .filter(|&i| {
            let (prev, cur, next) = (&samples[i - 1], &samples[i], &samples[i + 1]);
            flips(cur.x - prev.x, next.x - cur.x) || flips(cur.y - prev.y, next.y - cur.y)
        })
        .count() as u32
}

pub fn count_overshoots(samples: &[PointerSample], target: &Target, config: &ExtractionConfig) -> u32 {
    let distances: Vec<f64> = samples
        .iter()
        .map(|s| s.distance_to(target.x, target.y))
        .collect();
    let gate = config.overshoot_gate_radii * target.radius;

    let global = global_reversals(&distances, gate, config);
    let final_approach = final_approach_reversals(&distances, config);
    let oscillation = positional_oscillations(samples, &distances, gate, config);

    global.max(final_approach).max(oscillation)
}
