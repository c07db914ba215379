//! In-memory [`Store`] implementation for testing and embedding.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Bucket replacement swaps
//! the whole map under one write lock, and the id tables are checked and
//! updated under one write lock, which gives the same atomicity the SQLite
//! backend gets from transactions and unique constraints.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{
    DatabaseMetadata, IdMapping, SpeakerBuckets, SpeakerCount, StoreStats, TalkRecord,
};

use super::{InsertOutcome, Store};

#[derive(Default)]
struct IdTables {
    by_id: HashMap<String, IdMapping>,
    by_speakers: HashMap<String, String>,
}

/// In-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    buckets: RwLock<SpeakerBuckets>,
    metadata: RwLock<Option<DatabaseMetadata>>,
    ids: RwLock<IdTables>,
    refresh: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl Store for InMemoryStore {
    fn refresh_lock(&self) -> &Mutex<()> {
        &self.refresh
    }

    async fn replace_speaker_buckets(&self, buckets: &SpeakerBuckets) -> Result<()> {
        let fresh = buckets.clone();
        *self.buckets.write().map_err(poisoned)? = fresh;
        Ok(())
    }

    async fn speaker_counts(&self) -> Result<Vec<SpeakerCount>> {
        let buckets = self.buckets.read().map_err(poisoned)?;
        Ok(buckets
            .iter()
            .map(|(speaker, talks)| SpeakerCount {
                count: talks.len() as i64,
                speaker: speaker.clone(),
            })
            .collect())
    }

    async fn talks_for(&self, speaker: &str) -> Result<Vec<TalkRecord>> {
        let buckets = self.buckets.read().map_err(poisoned)?;
        Ok(buckets.get(speaker).cloned().unwrap_or_default())
    }

    async fn metadata(&self) -> Result<Option<DatabaseMetadata>> {
        Ok(self.metadata.read().map_err(poisoned)?.clone())
    }

    async fn put_metadata(&self, metadata: &DatabaseMetadata) -> Result<()> {
        *self.metadata.write().map_err(poisoned)? = Some(metadata.clone());
        Ok(())
    }

    async fn find_id(&self, speakers_key: &str) -> Result<Option<String>> {
        let ids = self.ids.read().map_err(poisoned)?;
        Ok(ids.by_speakers.get(speakers_key).cloned())
    }

    async fn id_mapping(&self, id: &str) -> Result<Option<IdMapping>> {
        let ids = self.ids.read().map_err(poisoned)?;
        Ok(ids.by_id.get(id).cloned())
    }

    async fn insert_id_mapping(&self, mapping: &IdMapping) -> Result<InsertOutcome> {
        let key = mapping.speakers_key();
        let mut ids = self.ids.write().map_err(poisoned)?;
        if let Some(existing) = ids.by_speakers.get(&key) {
            return Ok(InsertOutcome::SpeakersExist(existing.clone()));
        }
        if ids.by_id.contains_key(&mapping.id) {
            return Ok(InsertOutcome::IdTaken);
        }
        ids.by_speakers.insert(key, mapping.id.clone());
        ids.by_id.insert(mapping.id.clone(), mapping.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn clear_id_mappings(&self) -> Result<u64> {
        let mut ids = self.ids.write().map_err(poisoned)?;
        let removed = ids.by_id.len() as u64;
        *ids = IdTables::default();
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let buckets = self.buckets.read().map_err(poisoned)?;
        let id_mappings = self.ids.read().map_err(poisoned)?.by_id.len() as i64;
        let version = self
            .metadata
            .read()
            .map_err(poisoned)?
            .as_ref()
            .map(|m| m.version.clone());
        Ok(StoreStats {
            speakers: buckets.len() as i64,
            talks: buckets.values().map(|t| t.len() as i64).sum(),
            id_mappings,
            version,
        })
    }
}
