//! In-memory [`TranscriptStore`] implementation for tests.
//!
//! A `Vec` behind `std::sync::RwLock`; topic queries are linear scans.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result as AnyResult;
use async_trait::async_trait;

use crate::models::TranscriptRecord;

use super::{StoreError, TranscriptStore};

/// In-memory store for testing.
pub struct InMemoryStore {
    records: RwLock<Vec<TranscriptRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    async fn exists(&self, video_id: &str) -> AnyResult<bool> {
        let records = self.records.read().unwrap();
        Ok(records.iter().any(|r| r.video_id == video_id))
    }

    async fn save(&self, record: &TranscriptRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap();
        if records.iter().any(|r| r.video_id == record.video_id) {
            return Err(StoreError::DuplicateKey(record.video_id.clone()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn by_topic(&self, topic: &str) -> AnyResult<Vec<TranscriptRecord>> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.topic.contains(topic) && !r.text().is_empty())
            .cloned()
            .collect())
    }

    async fn count(&self) -> AnyResult<i64> {
        let records = self.records.read().unwrap();
        Ok(records.len() as i64)
    }

    async fn topics(&self) -> AnyResult<Vec<(String, i64)>> {
        let records = self.records.read().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for r in records.iter() {
            *counts.entry(r.topic.clone()).or_insert(0) += 1;
        }
        let mut topics: Vec<(String, i64)> = counts.into_iter().collect();
        topics.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(topics)
    }
}
