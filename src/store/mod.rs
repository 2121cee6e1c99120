//! Transcript storage abstraction.
//!
//! The [`TranscriptStore`] trait defines the storage operations needed by
//! the retrieval and research pipelines, enabling pluggable backends
//! (SQLite, in-memory for tests).
//!
//! The store is append-only: `save` inserts, nothing updates or deletes.
//! Insert-if-absent is a caller responsibility — callers check [`exists`]
//! before [`save`], and `save` fails with [`StoreError::DuplicateKey`] on a
//! repeated `video_id`. The research pipeline is single-threaded per run,
//! so this check-then-insert contract is not racy in practice; concurrent
//! ingestion would need an atomic upsert instead.
//!
//! [`exists`]: TranscriptStore::exists
//! [`save`]: TranscriptStore::save

pub mod memory;
pub mod sqlite;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use thiserror::Error;

use crate::models::TranscriptRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A transcript for this video id is already stored.
    #[error("transcript for video '{0}' already exists")]
    DuplicateKey(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Abstract transcript storage backend.
///
/// All operations are async (via `async-trait`); the in-memory
/// implementation returns immediately-ready futures.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Whether a transcript record for this video id is already stored.
    async fn exists(&self, video_id: &str) -> AnyResult<bool>;

    /// Insert a new record. Fails with [`StoreError::DuplicateKey`] when
    /// the video id is already present.
    async fn save(&self, record: &TranscriptRecord) -> Result<(), StoreError>;

    /// All records whose topic contains `topic` (substring match) and
    /// whose transcript text is present and non-empty.
    async fn by_topic(&self, topic: &str) -> AnyResult<Vec<TranscriptRecord>>;

    /// Total stored records, including transcript-less ones.
    async fn count(&self) -> AnyResult<i64>;

    /// Distinct topics with their record counts, most populous first.
    async fn topics(&self) -> AnyResult<Vec<(String, i64)>>;
}
