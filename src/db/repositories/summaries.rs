use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{from_json, parse_datetime, parse_round, to_i64, to_json, to_u32},
    models::{
        Round, RoundCounts, RoundSummary, SessionLabel, SessionSummary, TrainingPage,
        TrainingQuery,
    },
};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

const SESSION_SUMMARY_COLUMNS: &str = "session_id, participant_id, features_json, feature_version,
    label_level, label_score, label_source, label_version, computed_at, updated_at";

fn row_to_round_summary(row: &Row) -> Result<RoundSummary> {
    let features_json: String = row.get("features_json")?;
    let computed_at: String = row.get("computed_at")?;

    Ok(RoundSummary {
        session_id: row.get("session_id")?,
        participant_id: row.get("participant_id")?,
        round: parse_round(row.get("round")?)?,
        counts: RoundCounts {
            n_targets: to_u32(row.get("n_targets")?, "n_targets")?,
            n_hits: to_u32(row.get("n_hits")?, "n_hits")?,
            n_misses: to_u32(row.get("n_misses")?, "n_misses")?,
            hit_rate: row.get("hit_rate")?,
        },
        features: from_json(&features_json, "features_json")?,
        feature_version: row.get("feature_version")?,
        computed_at: parse_datetime(&computed_at, "computed_at")?,
    })
}

fn row_to_session_summary(row: &Row) -> Result<SessionSummary> {
    let features_json: String = row.get("features_json")?;
    let computed_at: String = row.get("computed_at")?;
    let updated_at: String = row.get("updated_at")?;

    let label = SessionLabel {
        level: row.get("label_level")?,
        score: row.get("label_score")?,
        source: row.get("label_source")?,
        version: row.get("label_version")?,
    };
    let label = (label != SessionLabel::default()).then_some(label);

    Ok(SessionSummary {
        session_id: row.get("session_id")?,
        participant_id: row.get("participant_id")?,
        features: from_json(&features_json, "features_json")?,
        feature_version: row.get("feature_version")?,
        label,
        computed_at: parse_datetime(&computed_at, "computed_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    /// Insert or overwrite the summary for `(session_id, round)`.
    pub async fn upsert_round_summary(&self, summary: &RoundSummary) -> Result<()> {
        let record = summary.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO round_summaries (
                    session_id, round, participant_id, n_targets, n_hits, n_misses,
                    hit_rate, features_json, feature_version, computed_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(session_id, round) DO UPDATE SET
                    participant_id = excluded.participant_id,
                    n_targets = excluded.n_targets,
                    n_hits = excluded.n_hits,
                    n_misses = excluded.n_misses,
                    hit_rate = excluded.hit_rate,
                    features_json = excluded.features_json,
                    feature_version = excluded.feature_version,
                    computed_at = excluded.computed_at",
                params![
                    record.session_id,
                    i64::from(record.round.get()),
                    record.participant_id,
                    i64::from(record.counts.n_targets),
                    i64::from(record.counts.n_hits),
                    i64::from(record.counts.n_misses),
                    record.counts.hit_rate,
                    to_json(&record.features, "round features")?,
                    record.feature_version,
                    record.computed_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_round_summary(
        &self,
        session_id: &str,
        round: Round,
    ) -> Result<Option<RoundSummary>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, round, participant_id, n_targets, n_hits, n_misses,
                        hit_rate, features_json, feature_version, computed_at
                 FROM round_summaries
                 WHERE session_id = ?1 AND round = ?2",
            )?;
            let mut rows = stmt.query(params![session_id, i64::from(round.get())])?;
            let summary = match rows.next()? {
                Some(row) => Some(row_to_round_summary(row)?),
                None => None,
            };
            Ok(summary)
        })
        .await
    }

    /// Insert or overwrite the session summary. An existing label is kept
    /// unless `summary.label` carries a replacement.
    pub async fn upsert_session_summary(&self, summary: &SessionSummary) -> Result<SessionSummary> {
        let record = summary.clone();
        self.execute(move |conn| {
            let label = record.label.clone().unwrap_or_default();
            let replace_label = record.label.is_some();

            conn.execute(
                "INSERT INTO session_summaries (
                    session_id, participant_id, features_json, feature_version,
                    label_level, label_score, label_source, label_version,
                    computed_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(session_id) DO UPDATE SET
                    participant_id = excluded.participant_id,
                    features_json = excluded.features_json,
                    feature_version = excluded.feature_version,
                    label_level = CASE WHEN ?11 THEN excluded.label_level ELSE label_level END,
                    label_score = CASE WHEN ?11 THEN excluded.label_score ELSE label_score END,
                    label_source = CASE WHEN ?11 THEN excluded.label_source ELSE label_source END,
                    label_version = CASE WHEN ?11 THEN excluded.label_version ELSE label_version END,
                    computed_at = excluded.computed_at,
                    updated_at = excluded.updated_at",
                params![
                    record.session_id,
                    record.participant_id,
                    to_json(&record.features, "session features")?,
                    record.feature_version,
                    label.level,
                    label.score,
                    label.source,
                    label.version,
                    record.computed_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                    replace_label,
                ],
            )?;

            let sql = format!(
                "SELECT {SESSION_SUMMARY_COLUMNS} FROM session_summaries WHERE session_id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![record.session_id])?;
            match rows.next()? {
                Some(row) => row_to_session_summary(row),
                None => Err(anyhow!("Session summary not found after upsert")),
            }
        })
        .await
    }

    pub async fn get_session_summary(&self, session_id: &str) -> Result<Option<SessionSummary>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {SESSION_SUMMARY_COLUMNS} FROM session_summaries WHERE session_id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![session_id])?;
            let summary = match rows.next()? {
                Some(row) => Some(row_to_session_summary(row)?),
                None => None,
            };
            Ok(summary)
        })
        .await
    }

    /// Replace only the label of an existing session summary.
    pub async fn update_session_label(
        &self,
        session_id: &str,
        label: SessionLabel,
        updated_at: DateTime<Utc>,
    ) -> Result<SessionSummary> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE session_summaries
                 SET label_level = ?1,
                     label_score = ?2,
                     label_source = ?3,
                     label_version = ?4,
                     updated_at = ?5
                 WHERE session_id = ?6",
                params![
                    label.level,
                    label.score,
                    label.source,
                    label.version,
                    updated_at.to_rfc3339(),
                    session_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Session summary not found for {session_id}"));
            }

            let sql = format!(
                "SELECT {SESSION_SUMMARY_COLUMNS} FROM session_summaries WHERE session_id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => row_to_session_summary(row),
                None => Err(anyhow!("Session summary not found for {session_id}")),
            }
        })
        .await
    }

    /// Session summaries filtered by label level and/or participant, newest first.
    pub async fn query_training_data(&self, query: TrainingQuery) -> Result<TrainingPage> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        self.execute(move |conn| {
            let filter = "(?1 IS NULL OR label_level = ?1) AND (?2 IS NULL OR participant_id = ?2)";

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM session_summaries WHERE {filter}"),
                params![query.label_level, query.participant_id],
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {SESSION_SUMMARY_COLUMNS} FROM session_summaries
                 WHERE {filter}
                 ORDER BY computed_at DESC, session_id ASC
                 LIMIT ?3 OFFSET ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                query.label_level,
                query.participant_id,
                to_i64(limit as u64)?,
                to_i64(offset as u64)?,
            ])?;

            let mut page_rows = Vec::new();
            while let Some(row) = rows.next()? {
                page_rows.push(row_to_session_summary(row)?);
            }

            Ok(TrainingPage {
                total: total.max(0) as u64,
                limit,
                offset,
                rows: page_rows,
            })
        })
        .await
    }
}
