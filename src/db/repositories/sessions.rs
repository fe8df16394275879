use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{from_optional_json, parse_datetime, session_exists_in, to_json},
    models::{Session, SessionInput},
};

fn row_to_session(row: &Row) -> Result<Session> {
    let device_json: Option<String> = row.get("device_json")?;
    let game_json: Option<String> = row.get("game_json")?;
    let created_at: String = row.get("created_at")?;

    Ok(Session {
        id: row.get("id")?,
        participant_id: row.get("participant_id")?,
        device: from_optional_json(device_json, "device_json")?,
        game: from_optional_json(game_json, "game_json")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn create_session(&self, input: SessionInput) -> Result<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            participant_id: input.participant_id,
            device: input.device,
            game: input.game,
            created_at: Utc::now(),
        };
        let record = session.clone();

        self.execute(move |conn| {
            let device_json = record
                .device
                .as_ref()
                .map(|value| to_json(value, "device"))
                .transpose()?;
            let game_json = record
                .game
                .as_ref()
                .map(|value| to_json(value, "game"))
                .transpose()?;

            conn.execute(
                "INSERT INTO sessions (id, participant_id, device_json, game_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.participant_id,
                    device_json,
                    game_json,
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert session")?;
            Ok(())
        })
        .await?;

        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, participant_id, device_json, game_json, created_at
                 FROM sessions
                 WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    pub async fn session_exists(&self, session_id: &str) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute(move |conn| session_exists_in(conn, &session_id))
            .await
    }

    /// Participant the session was registered for, if any.
    pub async fn session_user_id(&self, session_id: &str) -> Result<Option<String>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let participant: Option<Option<String>> = conn
                .query_row(
                    "SELECT participant_id FROM sessions WHERE id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(participant.flatten())
        })
        .await
    }

    /// Delete a session. Buckets and summaries go with it via ON DELETE CASCADE.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
            Ok(rows_affected > 0)
        })
        .await
    }
}
