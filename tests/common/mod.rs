//! Shared fixtures for the pipeline and store tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use speakercast::canonical::Canonicalizer;
use speakercast::ingest::IngestOptions;
use speakercast::models::{
    AudioAsset, DatabaseMetadata, IdMapping, RawTalkRecord, SpeakerBuckets, SpeakerCount,
    StoreStats, TalkRecord,
};
use speakercast::period::Period;
use speakercast::store::memory::InMemoryStore;
use speakercast::store::{InsertOutcome, Store};
use speakercast::update::{RangeEnd, Updater};
use speakercast_core::catalog::Catalog;
use speakercast_core::error::FetchError;

/// Catalog backed by in-process maps. Periods without a listing return an
/// empty one; periods marked as failing return a transport error.
pub struct FakeCatalog {
    version: Mutex<String>,
    listings: Mutex<HashMap<Period, Vec<RawTalkRecord>>>,
    failing: Mutex<Vec<Period>>,
    fetches: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(version: &str) -> Self {
        Self {
            version: Mutex::new(version.to_string()),
            listings: Mutex::new(HashMap::new()),
            failing: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_listing(self, period: Period, talks: Vec<RawTalkRecord>) -> Self {
        self.listings.lock().unwrap().insert(period, talks);
        self
    }

    pub fn set_version(&self, version: &str) {
        *self.version.lock().unwrap() = version.to_string();
    }

    pub fn set_listing(&self, period: Period, talks: Vec<RawTalkRecord>) {
        self.listings.lock().unwrap().insert(period, talks);
    }

    pub fn fail(&self, period: Period) {
        self.failing.lock().unwrap().push(period);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn current_version(&self) -> Result<String, FetchError> {
        Ok(self.version.lock().unwrap().clone())
    }

    async fn fetch(&self, period: Period) -> Result<Vec<RawTalkRecord>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.failing.lock().unwrap().contains(&period) {
            return Err(FetchError::Transport {
                target: period.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(&period)
            .cloned()
            .unwrap_or_default())
    }
}

/// Store whose bucket replacement can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_replace: AtomicBool,
}

#[async_trait]
impl Store for FlakyStore {
    fn refresh_lock(&self) -> &tokio::sync::Mutex<()> {
        self.inner.refresh_lock()
    }
    async fn replace_speaker_buckets(&self, buckets: &SpeakerBuckets) -> Result<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.replace_speaker_buckets(buckets).await
    }
    async fn speaker_counts(&self) -> Result<Vec<SpeakerCount>> {
        self.inner.speaker_counts().await
    }
    async fn talks_for(&self, speaker: &str) -> Result<Vec<TalkRecord>> {
        self.inner.talks_for(speaker).await
    }
    async fn metadata(&self) -> Result<Option<DatabaseMetadata>> {
        self.inner.metadata().await
    }
    async fn put_metadata(&self, metadata: &DatabaseMetadata) -> Result<()> {
        self.inner.put_metadata(metadata).await
    }
    async fn find_id(&self, speakers_key: &str) -> Result<Option<String>> {
        self.inner.find_id(speakers_key).await
    }
    async fn id_mapping(&self, id: &str) -> Result<Option<IdMapping>> {
        self.inner.id_mapping(id).await
    }
    async fn insert_id_mapping(&self, mapping: &IdMapping) -> Result<InsertOutcome> {
        self.inner.insert_id_mapping(mapping).await
    }
    async fn clear_id_mappings(&self) -> Result<u64> {
        self.inner.clear_id_mappings().await
    }
    async fn stats(&self) -> Result<StoreStats> {
        self.inner.stats().await
    }
}

/// A raw talk with a URL derived from its title.
pub fn raw_talk(title: &str, speaker: &str, session: &str, with_audio: bool) -> RawTalkRecord {
    let slug = title.to_lowercase().replace(' ', "-");
    RawTalkRecord {
        title: title.to_string(),
        speaker: speaker.to_string(),
        session: session.to_string(),
        uri: format!("/general-conference/{}", slug),
        url: format!("https://catalog.example.org/{}", slug),
        preview: String::new(),
        audio: with_audio.then(|| AudioAsset {
            url: format!("https://media.example.org/{}.mp3", slug),
            size: Some(1024),
        }),
    }
}

/// Updater over 2020/04 ..= 2021/10 (four periods).
pub fn updater(store: Arc<dyn Store>, catalog: Arc<dyn Catalog>, options: IngestOptions) -> Updater {
    Updater::new(
        store,
        catalog,
        Canonicalizer::default(),
        (2020, 4),
        RangeEnd::Fixed(2021, 10),
        options,
    )
}
