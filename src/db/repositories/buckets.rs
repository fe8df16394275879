//! Bucketed storage for raw samples and enriched attempts.

use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Transaction};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::{
    buckets::{concat_buckets, fill_buckets, Bucket},
    connection::Database,
    helpers::{from_json, session_exists_in, to_i64, to_json, to_u32},
    models::{EnrichedAttempt, PointerSample, Round},
    UnknownSession,
};

/// Records that can live in a bucket.
pub trait BucketItem: Serialize + DeserializeOwned + Send + 'static {
    const TABLE: &'static str;

    fn round(&self) -> Round;
    fn stamp_ms(&self) -> f64;
}

impl BucketItem for PointerSample {
    const TABLE: &'static str = "sample_buckets";

    fn round(&self) -> Round {
        self.round
    }

    fn stamp_ms(&self) -> f64 {
        self.t_ms
    }
}

impl BucketItem for EnrichedAttempt {
    const TABLE: &'static str = "attempt_buckets";

    fn round(&self) -> Round {
        self.attempt.round
    }

    fn stamp_ms(&self) -> f64 {
        self.attempt.spawn_t_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub appended: usize,
    pub buckets_written: usize,
    pub last_bucket_index: Option<u32>,
}

/// Shape of one stored bucket, without its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketInfo {
    pub index: u32,
    pub item_count: u32,
    pub capacity: u32,
}

fn load_tail<T: BucketItem>(tx: &Transaction<'_>, session_id: &str) -> Result<Option<Bucket<T>>> {
    let sql = format!(
        "SELECT bucket_index, capacity, payload_json FROM {}
         WHERE session_id = ?1
         ORDER BY bucket_index DESC
         LIMIT 1",
        T::TABLE
    );
    let row: Option<(i64, i64, String)> = tx
        .query_row(&sql, params![session_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .optional()?;

    match row {
        Some((index, capacity, payload)) => Ok(Some(Bucket {
            index: to_u32(index, "bucket_index")?,
            capacity: to_u32(capacity, "capacity")? as usize,
            items: from_json(&payload, T::TABLE)?,
        })),
        None => Ok(None),
    }
}

fn write_bucket<T: BucketItem>(
    tx: &Transaction<'_>,
    session_id: &str,
    bucket: &Bucket<T>,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let first_t_ms = bucket.items.first().map(T::stamp_ms);
    let last_t_ms = bucket.items.last().map(T::stamp_ms);
    let payload = to_json(&bucket.items, T::TABLE)?;

    let sql = format!(
        "INSERT INTO {} (session_id, bucket_index, item_count, capacity, first_t_ms, last_t_ms, payload_json, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
         ON CONFLICT(session_id, bucket_index) DO UPDATE SET
             item_count = excluded.item_count,
             last_t_ms = excluded.last_t_ms,
             payload_json = excluded.payload_json,
             updated_at = excluded.updated_at",
        T::TABLE
    );
    tx.execute(
        &sql,
        params![
            session_id,
            i64::from(bucket.index),
            to_i64(bucket.len() as u64)?,
            to_i64(bucket.capacity as u64)?,
            first_t_ms,
            last_t_ms,
            payload,
            now,
        ],
    )?;
    Ok(())
}

impl Database {
    async fn append_items<T: BucketItem>(
        &self,
        session_id: &str,
        items: Vec<T>,
        capacity: usize,
    ) -> Result<AppendOutcome> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            if !session_exists_in(&tx, &session_id)? {
                bail!(UnknownSession(session_id));
            }

            let appended = items.len();
            let tail = load_tail::<T>(&tx, &session_id)?;
            let written = fill_buckets(tail, items, capacity);
            for bucket in &written {
                write_bucket(&tx, &session_id, bucket)?;
            }
            tx.commit()?;

            Ok(AppendOutcome {
                appended,
                buckets_written: written.len(),
                last_bucket_index: written.last().map(|bucket| bucket.index),
            })
        })
        .await
    }

    async fn load_items<T: BucketItem>(
        &self,
        session_id: &str,
        round: Option<Round>,
    ) -> Result<Vec<T>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT bucket_index, capacity, payload_json FROM {}
                 WHERE session_id = ?1
                 ORDER BY bucket_index ASC",
                T::TABLE
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![session_id])?;

            let mut buckets = Vec::new();
            while let Some(row) = rows.next()? {
                let index: i64 = row.get(0)?;
                let capacity: i64 = row.get(1)?;
                let payload: String = row.get(2)?;
                buckets.push(Bucket {
                    index: to_u32(index, "bucket_index")?,
                    capacity: to_u32(capacity, "capacity")? as usize,
                    items: from_json::<Vec<T>>(&payload, T::TABLE)?,
                });
            }

            let mut items = concat_buckets(buckets);
            if let Some(round) = round {
                items.retain(|item| item.round() == round);
            }
            Ok(items)
        })
        .await
    }

    async fn bucket_infos<T: BucketItem>(&self, session_id: &str) -> Result<Vec<BucketInfo>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT bucket_index, item_count, capacity FROM {}
                 WHERE session_id = ?1
                 ORDER BY bucket_index ASC",
                T::TABLE
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![session_id])?;
            let mut infos = Vec::new();
            while let Some(row) = rows.next()? {
                infos.push(BucketInfo {
                    index: to_u32(row.get(0)?, "bucket_index")?,
                    item_count: to_u32(row.get(1)?, "item_count")?,
                    capacity: to_u32(row.get(2)?, "capacity")?,
                });
            }
            Ok(infos)
        })
        .await
    }

    /// Append raw samples, rolling into new buckets once `capacity` is reached.
    pub async fn append_samples(
        &self,
        session_id: &str,
        samples: Vec<PointerSample>,
        capacity: usize,
    ) -> Result<AppendOutcome> {
        self.append_items(session_id, samples, capacity).await
    }

    /// All samples for a session in submission order, optionally for one round.
    pub async fn get_samples(
        &self,
        session_id: &str,
        round: Option<Round>,
    ) -> Result<Vec<PointerSample>> {
        self.load_items(session_id, round).await
    }

    pub async fn append_attempts(
        &self,
        session_id: &str,
        attempts: Vec<EnrichedAttempt>,
        capacity: usize,
    ) -> Result<AppendOutcome> {
        self.append_items(session_id, attempts, capacity).await
    }

    pub async fn get_attempts(
        &self,
        session_id: &str,
        round: Option<Round>,
    ) -> Result<Vec<EnrichedAttempt>> {
        self.load_items(session_id, round).await
    }

    pub async fn sample_buckets(&self, session_id: &str) -> Result<Vec<BucketInfo>> {
        self.bucket_infos::<PointerSample>(session_id).await
    }

    pub async fn attempt_buckets(&self, session_id: &str) -> Result<Vec<BucketInfo>> {
        self.bucket_infos::<EnrichedAttempt>(session_id).await
    }
}
