//! SQLite connection management for the transcript library.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::DbConfig;

/// The pipeline is sequential; a handful of connections covers the CLI plus
/// any concurrent stats query.
const MAX_CONNECTIONS: u32 = 5;

/// Open a pool onto the configured transcript database, creating the file
/// and its parent directories on first use. WAL mode keeps chat reads from
/// blocking an ingestion pass in another process.
pub async fn connect(db: &DbConfig) -> Result<SqlitePool> {
    if let Some(parent) = db.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db.path.display()))?;

    Ok(pool)
}
