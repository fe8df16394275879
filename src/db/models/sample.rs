//! Raw pointer telemetry.

use serde::{Deserialize, Serialize};

use super::Round;

/// One pointer position captured by the task client. Coordinates are
/// normalized to `[0, 1]`; `t_ms` is an absolute client timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerSample {
    pub round: Round,
    #[serde(rename = "t_ms")]
    pub t_ms: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub is_down: bool,
    #[serde(default = "default_pointer_type")]
    pub pointer_type: String,
}

fn default_pointer_type() -> String {
    "mouse".into()
}

impl PointerSample {
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }

    pub fn distance_to_sample(&self, other: &PointerSample) -> f64 {
        self.distance_to(other.x, other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.t_ms.is_finite() && self.x.is_finite() && self.y.is_finite()
    }
}
