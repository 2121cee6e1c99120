//! SQLite-backed [`TranscriptStore`] implementation.
//!
//! Maps each store operation onto the `transcripts` table created by
//! [`migrate`](crate::migrate). Timestamps are stored as RFC 3339 text.

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::TranscriptRecord;

use super::{StoreError, TranscriptStore};

/// SQLite implementation of [`TranscriptStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> TranscriptRecord {
    TranscriptRecord {
        video_id: row.get("video_id"),
        title: row.get("title"),
        topic: row.get("topic"),
        transcript: row.get("transcript"),
        published_at: parse_ts(row.get("published_date")),
        created_at: parse_ts(row.get("created_at")).unwrap_or_else(Utc::now),
    }
}

#[async_trait]
impl TranscriptStore for SqliteStore {
    async fn exists(&self, video_id: &str) -> AnyResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transcripts WHERE video_id = ?")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn save(&self, record: &TranscriptRecord) -> Result<(), StoreError> {
        // video_id is logically unique; enforce it at the write path since
        // the schema carries no UNIQUE constraint.
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transcripts WHERE video_id = ?")
                .bind(&record.video_id)
                .fetch_one(&self.pool)
                .await
                .context("duplicate pre-check failed")?;
        if count > 0 {
            return Err(StoreError::DuplicateKey(record.video_id.clone()));
        }

        sqlx::query(
            r#"
            INSERT INTO transcripts (video_id, title, topic, transcript, published_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.video_id)
        .bind(&record.title)
        .bind(&record.topic)
        .bind(&record.transcript)
        .bind(record.published_at.map(|dt| dt.to_rfc3339()))
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("transcript insert failed")?;

        Ok(())
    }

    async fn by_topic(&self, topic: &str) -> AnyResult<Vec<TranscriptRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT video_id, title, topic, transcript, published_date, created_at
            FROM transcripts
            WHERE topic LIKE '%' || ? || '%'
              AND transcript IS NOT NULL
              AND transcript != ''
            ORDER BY id ASC
            "#,
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self) -> AnyResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transcripts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn topics(&self) -> AnyResult<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT topic, COUNT(*) AS n
            FROM transcripts
            GROUP BY topic
            ORDER BY n DESC, topic ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("topic"), row.get("n")))
            .collect())
    }
}
