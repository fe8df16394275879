use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{de::DeserializeOwned, Serialize};

use crate::db::models::Round;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_round(value: i64) -> Result<Round> {
    u8::try_from(value)
        .map_err(|_| anyhow!("round column contains out-of-range value {value}"))
        .and_then(|raw| Round::try_from(raw).map_err(|err| anyhow!(err)))
}

pub fn to_json<T: Serialize>(value: &T, field: &str) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("failed to serialize {field}"))
}

pub fn from_json<T: DeserializeOwned>(raw: &str, field: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("failed to parse {field}"))
}

pub fn from_optional_json<T: DeserializeOwned>(raw: Option<String>, field: &str) -> Result<Option<T>> {
    match raw {
        Some(raw) => from_json(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn session_exists_in(conn: &rusqlite::Connection, session_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sessions WHERE id = ?1",
            [session_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
