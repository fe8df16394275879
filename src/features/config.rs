use serde::{Deserialize, Serialize};

/// Thresholds used by the attempt feature extractor.
/// Distances are in normalized screen units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    /// Segments shorter than this only yield timing features
    pub min_segment_samples: usize,

    /// Displacement from the first sample that counts as "moving"
    pub movement_start_threshold: f64,

    /// Centered moving-average window applied to speed before peak counting
    pub smoothing_window: usize,
    /// Smoothed speed peaks below this fraction of peak speed are ignored
    pub submovement_peak_ratio: f64,

    /// Overshoot detectors only look inside this many target radii
    pub overshoot_gate_radii: f64,
    /// Minimum distance-to-target delta that counts as approach or retreat
    pub reversal_delta: f64,
    /// Trailing share of the moving segment checked by the final-approach detector
    pub final_approach_fraction: f64,
    /// The final-approach window needs strictly more samples than this
    pub final_approach_min_samples: usize,
    /// Minimum per-axis step on both sides of a direction reversal
    pub oscillation_step: f64,

    /// Floor applied to movement time before computing throughput
    pub min_movement_time_secs: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_segment_samples: 4,
            movement_start_threshold: 0.003,
            smoothing_window: 5,
            submovement_peak_ratio: 0.15,
            overshoot_gate_radii: 4.0,
            reversal_delta: 0.001,
            final_approach_fraction: 0.3,
            final_approach_min_samples: 5,
            oscillation_step: 0.002,
            min_movement_time_secs: 0.05,
        }
    }
}
