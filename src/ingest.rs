//! Topic ingestion: search for videos, fetch transcripts, store records.
//!
//! Already-stored videos are skipped before any transcript fetch, so
//! repeated ingestion of the same topic is cheap and idempotent. Videos
//! without fetchable captions are stored with an absent transcript; the
//! record is a terminal state that prevents refetching, and the store
//! excludes it from retrieval.

use anyhow::Result;
use chrono::Utc;

use crate::models::TranscriptRecord;
use crate::source::VideoSource;
use crate::store::{StoreError, TranscriptStore};

/// Outcome counters for one ingestion pass.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Newly stored records, transcript-less ones included.
    pub saved: Vec<TranscriptRecord>,
    /// Videos skipped because they were already stored.
    pub skipped: usize,
    /// Videos whose transcript fetch errored (not stored).
    pub errored: usize,
}

impl FetchOutcome {
    /// Newly stored records that actually carry transcript text.
    pub fn with_transcripts(&self) -> Vec<&TranscriptRecord> {
        self.saved.iter().filter(|r| !r.text().is_empty()).collect()
    }
}

/// Search for videos matching `query`, fetch their transcripts, and store
/// them under `topic`.
pub async fn fetch_topic(
    store: &dyn TranscriptStore,
    source: &dyn VideoSource,
    topic: &str,
    query: &str,
    max_results: usize,
) -> Result<FetchOutcome> {
    let hits = source.search(query, max_results).await?;

    let mut outcome = FetchOutcome::default();
    for hit in hits {
        if store.exists(&hit.video_id).await? {
            outcome.skipped += 1;
            continue;
        }

        let transcript = match source.fetch_transcript(&hit.video_id).await {
            Ok(t) => t,
            Err(_) => {
                // One bad video must not sink the pass.
                outcome.errored += 1;
                continue;
            }
        };

        let record = TranscriptRecord {
            video_id: hit.video_id,
            title: hit.title,
            topic: topic.to_string(),
            transcript,
            published_at: hit.published_at,
            created_at: Utc::now(),
        };

        match store.save(&record).await {
            Ok(()) => outcome.saved.push(record),
            // Lost the check-then-insert race with another process; treat
            // the record as already stored.
            Err(StoreError::DuplicateKey(_)) => outcome.skipped += 1,
            Err(StoreError::Backend(e)) => return Err(e),
        }
    }

    Ok(outcome)
}

/// CLI entry point for `tsg fetch`.
pub async fn run_fetch(
    store: &dyn TranscriptStore,
    source: &dyn VideoSource,
    topic: &str,
    query: &str,
    max_results: usize,
) -> Result<()> {
    println!("Fetching videos for topic '{}'...", topic);

    let outcome = fetch_topic(store, source, topic, query, max_results).await?;
    let with_text = outcome.with_transcripts().len();

    for record in &outcome.saved {
        let marker = if record.text().is_empty() { "(no captions)" } else { "" };
        println!("  + {} {}", record.title, marker);
    }

    println!(
        "{} stored ({} with transcripts), {} already present, {} errored",
        outcome.saved.len(),
        with_text,
        outcome.skipped,
        outcome.errored
    );
    println!("ok");
    Ok(())
}
