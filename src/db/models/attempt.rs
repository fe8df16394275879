//! Attempt records and the feature blocks derived for them.
//!
//! An attempt arrives from the task client as [`Attempt`] and is stored as an
//! [`EnrichedAttempt`]. Enrichment either produced the full feature set or, when
//! extraction was impossible, only the timing block; [`AttemptFeatures`] keeps
//! that distinction explicit instead of scattering nulls.

use serde::{Deserialize, Serialize};

use super::Round;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    #[serde(default)]
    pub clicked: bool,
    #[serde(default)]
    pub hit: bool,
    #[serde(default)]
    pub miss_type: Option<String>,
    #[serde(rename = "t_ms", default)]
    pub t_ms: Option<f64>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// Reaction time as measured by the client, when it reported one.
    #[serde(default)]
    pub rt_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub round: Round,
    pub attempt_id: String,
    #[serde(default)]
    pub bubble_id: Option<String>,
    #[serde(rename = "spawn_t_ms")]
    pub spawn_t_ms: f64,
    pub target: Target,
    #[serde(default)]
    pub click: Click,
}

impl Attempt {
    /// Click timestamp, only when the attempt actually ended in a click.
    pub fn click_time(&self) -> Option<f64> {
        if self.click.clicked {
            self.click.t_ms
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub reaction_time_ms: Option<f64>,
    pub movement_time_ms: Option<f64>,
    pub inter_tap_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spatial {
    pub error_dist_norm: Option<f64>,
    pub path_length_norm: Option<f64>,
    pub direct_dist_norm: Option<f64>,
    pub straightness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kinematics {
    pub mean_speed: Option<f64>,
    pub peak_speed: Option<f64>,
    pub speed_var: Option<f64>,
    pub mean_accel: Option<f64>,
    pub peak_accel: Option<f64>,
    #[serde(rename = "jerkRMS")]
    pub jerk_rms: Option<f64>,
    pub submovement_count: Option<u32>,
    pub overshoot_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fitts {
    #[serde(rename = "D")]
    pub distance: Option<f64>,
    #[serde(rename = "W")]
    pub width: Option<f64>,
    #[serde(rename = "ID")]
    pub index_of_difficulty: Option<f64>,
    pub throughput: Option<f64>,
}

/// Output of the attempt feature extractor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    pub timing: Timing,
    pub spatial: Spatial,
    pub kinematics: Kinematics,
    pub fitts: Fitts,
}

/// Degraded features used when no pointer trace could be analysed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicFeatures {
    pub timing: Timing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "quality", rename_all = "lowercase")]
pub enum AttemptFeatures {
    Full(FeatureSet),
    Basic(BasicFeatures),
}

impl AttemptFeatures {
    pub fn timing(&self) -> &Timing {
        match self {
            AttemptFeatures::Full(set) => &set.timing,
            AttemptFeatures::Basic(basic) => &basic.timing,
        }
    }

    pub fn full(&self) -> Option<&FeatureSet> {
        match self {
            AttemptFeatures::Full(set) => Some(set),
            AttemptFeatures::Basic(_) => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, AttemptFeatures::Full(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedAttempt {
    pub attempt: Attempt,
    pub features: AttemptFeatures,
}

impl EnrichedAttempt {
    pub fn is_hit(&self) -> bool {
        self.attempt.click.hit
    }
}
