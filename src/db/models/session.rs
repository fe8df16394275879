//! Session registry records.
//!
//! The engine only needs to know that a session exists and which participant it
//! belongs to; device and game metadata are carried through as opaque JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub participant_id: Option<String>,
    pub device: Option<Value>,
    pub game: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Input data for registering a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub device: Option<Value>,
    #[serde(default)]
    pub game: Option<Value>,
}
