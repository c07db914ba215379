//! Read and registry operations consumed by feed and listing front ends.
//!
//! [`SpeakerIndex`] bundles the store, the id registry, and the updater
//! behind the narrow interface front ends use:
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`all_speakers_and_counts`](SpeakerIndex::all_speakers_and_counts) | Speakers by talk count, descending |
//! | [`talks`](SpeakerIndex::talks) | Concatenated buckets for a speaker set |
//! | [`generate_id`](SpeakerIndex::generate_id) | Id for a speaker set |
//! | [`speakers`](SpeakerIndex::speakers) | Speaker set for an id |
//! | [`update_database`](SpeakerIndex::update_database) | Version-gated refresh |
//!
//! Unknown speakers yield no talks and unknown ids yield `None`; neither
//! is an error.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use speakercast_core::catalog::Catalog;
use speakercast_core::error::IdGenerationError;
use speakercast_core::models::{SpeakerCount, StoreStats, TalkRecord};
use speakercast_core::registry::{random_id_generator, IdRegistry};
use speakercast_core::store::Store;

use crate::config::Config;
use crate::update::{RefreshOutcome, UpdateError, Updater};

pub struct SpeakerIndex {
    store: Arc<dyn Store>,
    registry: IdRegistry,
    updater: Updater,
}

impl SpeakerIndex {
    pub fn new(store: Arc<dyn Store>, registry: IdRegistry, updater: Updater) -> Self {
        Self {
            store,
            registry,
            updater,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn Store>, catalog: Arc<dyn Catalog>) -> Self {
        let registry = IdRegistry::with_generator(
            Arc::clone(&store),
            random_id_generator(config.ids.length),
            config.ids.max_attempts,
        );
        let updater = Updater::from_config(config, Arc::clone(&store), catalog);
        Self::new(store, registry, updater)
    }

    /// `(count, speaker)` sorted by count descending, then by name.
    pub async fn all_speakers_and_counts(&self) -> Result<Vec<SpeakerCount>> {
        let mut counts = self.store.speaker_counts().await?;
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.speaker.cmp(&b.speaker)));
        Ok(counts)
    }

    /// Every talk of every listed speaker, bucket after bucket.
    ///
    /// A speaker listed twice contributes once. Talks are not deduplicated
    /// across speakers.
    pub async fn talks<S: AsRef<str> + Sync>(&self, speakers: &[S]) -> Result<Vec<TalkRecord>> {
        let mut seen = HashSet::new();
        let mut talks = Vec::new();
        for speaker in speakers {
            let speaker = speaker.as_ref();
            if seen.insert(speaker) {
                talks.extend(self.store.talks_for(speaker).await?);
            }
        }
        Ok(talks)
    }

    pub async fn generate_id<S: AsRef<str> + Sync>(
        &self,
        speakers: &[S],
    ) -> Result<String, IdGenerationError> {
        self.registry.id_for(speakers.iter().map(|s| s.as_ref())).await
    }

    pub async fn speakers(&self, id: &str) -> Result<Option<Vec<String>>> {
        self.registry.speakers_for(id).await
    }

    pub async fn update_database(&self, force: bool) -> Result<RefreshOutcome, UpdateError> {
        self.updater.refresh(force).await
    }

    pub async fn clear_ids(&self) -> Result<u64> {
        self.registry.clear().await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}
