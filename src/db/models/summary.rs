//! Round and session summaries plus the training-data view over them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Round;

/// Named aggregate values. `None` means "not computable", never zero.
pub type FeatureMap = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCounts {
    pub n_targets: u32,
    pub n_hits: u32,
    pub n_misses: u32,
    pub hit_rate: f64,
}

/// Aggregated features for one round, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundFeatures {
    pub counts: RoundCounts,
    pub features: FeatureMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub session_id: String,
    pub participant_id: Option<String>,
    pub round: Round,
    pub counts: RoundCounts,
    pub features: FeatureMap,
    pub feature_version: String,
    pub computed_at: DateTime<Utc>,
}

/// Supervised-learning annotation attached to a session summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLabel {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub participant_id: Option<String>,
    pub features: FeatureMap,
    pub feature_version: String,
    pub label: Option<SessionLabel>,
    pub computed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for exporting labelled session summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingQuery {
    #[serde(default)]
    pub label_level: Option<String>,
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPage {
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
    pub rows: Vec<SessionSummary>,
}
