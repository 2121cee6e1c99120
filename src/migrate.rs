use anyhow::Result;
use sqlx::SqlitePool;

/// Create the transcripts table. Idempotent.
///
/// `video_id` intentionally carries no UNIQUE constraint (the historical
/// schema this mirrors did not declare one); uniqueness is enforced by the
/// write path in [`SqliteStore`](crate::store::sqlite::SqliteStore).
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transcripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            video_id TEXT NOT NULL,
            title TEXT NOT NULL,
            topic TEXT NOT NULL,
            transcript TEXT,
            published_date TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transcripts_video_id ON transcripts(video_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transcripts_topic ON transcripts(topic)")
        .execute(pool)
        .await?;

    Ok(())
}
