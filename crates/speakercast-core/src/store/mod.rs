//! Storage abstraction for Speakercast.
//!
//! The [`Store`] trait owns the three logical tables of the engine:
//! speaker buckets, the single metadata record, and id mappings. Backends
//! are pluggable (SQLite in the main crate, [`memory::InMemoryStore`]
//! here for tests and embedding).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{
    DatabaseMetadata, IdMapping, SpeakerBuckets, SpeakerCount, StoreStats, TalkRecord,
};

/// Outcome of [`Store::insert_id_mapping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The mapping was written.
    Inserted,
    /// The id already belongs to another speaker set. Nothing was written.
    IdTaken,
    /// The speaker set already has this id. Nothing was written.
    SpeakersExist(String),
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`replace_speaker_buckets`](Store::replace_speaker_buckets) | Atomically swap in a rebuilt data set |
/// | [`speaker_counts`](Store::speaker_counts) | Talk count per speaker |
/// | [`talks_for`](Store::talks_for) | One speaker's bucket |
/// | [`metadata`](Store::metadata) / [`put_metadata`](Store::put_metadata) | Committed version |
/// | [`find_id`](Store::find_id) / [`id_mapping`](Store::id_mapping) | Registry lookups |
/// | [`insert_id_mapping`](Store::insert_id_mapping) | Compare-and-swap registry insert |
/// | [`clear_id_mappings`](Store::clear_id_mappings) | Registry reset |
/// | [`refresh_lock`](Store::refresh_lock) | Serializes rebuilds of this store |
#[async_trait]
pub trait Store: Send + Sync {
    /// Held for the whole read-version, rebuild, write-version sequence.
    ///
    /// Every updater over the same store instance contends on this one
    /// lock, so rebuilds of a store never interleave.
    fn refresh_lock(&self) -> &Mutex<()>;

    /// Replace every speaker bucket with `buckets`.
    ///
    /// Readers see either the old collection or the new one, never a mix.
    /// On error the old collection stays in place.
    async fn replace_speaker_buckets(&self, buckets: &SpeakerBuckets) -> Result<()>;

    /// `(count, speaker)` for every stored speaker, in no particular order.
    async fn speaker_counts(&self) -> Result<Vec<SpeakerCount>>;

    /// The bucket for `speaker` in insertion order; empty when unknown.
    async fn talks_for(&self, speaker: &str) -> Result<Vec<TalkRecord>>;

    async fn metadata(&self) -> Result<Option<DatabaseMetadata>>;

    /// Upsert the single metadata record.
    async fn put_metadata(&self, metadata: &DatabaseMetadata) -> Result<()>;

    /// Id assigned to the canonical speaker set encoded as `speakers_key`.
    async fn find_id(&self, speakers_key: &str) -> Result<Option<String>>;

    async fn id_mapping(&self, id: &str) -> Result<Option<IdMapping>>;

    /// Insert `mapping` unless its id or its speaker set is already
    /// present. Check and write happen as one atomic step.
    async fn insert_id_mapping(&self, mapping: &IdMapping) -> Result<InsertOutcome>;

    /// Remove every id mapping. Returns how many were removed.
    async fn clear_id_mappings(&self) -> Result<u64>;

    async fn stats(&self) -> Result<StoreStats>;
}
