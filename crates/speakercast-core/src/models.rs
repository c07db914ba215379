//! Core data models used throughout Speakercast.
//!
//! These types represent the talks, speaker buckets, and registry entries
//! that flow from the catalog through normalization into the store.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical::Session;

/// Unnormalized talk fields as delivered by a catalog for one period.
///
/// Never persisted: the pipeline turns it into a [`TalkRecord`] or drops it.
///
/// Historical listings omit fields or send them as `null`; every string
/// field decodes as empty in that case and the canonicalizer decides what
/// is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTalkRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub session: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview: String,
    #[serde(default)]
    pub audio: Option<AudioAsset>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The audio rendition of a talk. Absent for some historical talks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudioAsset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub size: Option<i64>,
}

/// A normalized talk, as stored in a speaker bucket.
///
/// `speaker` is canonical (see [`crate::canonical::clean_speaker`]) and
/// `scheduled_time` / `audio_url` are always present; records lacking
/// either never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TalkRecord {
    pub title: String,
    pub speaker: String,
    pub session: Session,
    pub scheduled_time: DateTime<FixedOffset>,
    pub uri: String,
    pub url: String,
    pub preview: String,
    pub audio_url: String,
    /// Audio size in bytes; `0` when the catalog did not report one.
    pub audio_size: i64,
}

/// Canonical speaker → talks, in the order the talks were produced.
pub type SpeakerBuckets = HashMap<String, Vec<TalkRecord>>;

/// The single metadata row describing the committed data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseMetadata {
    /// Catalog version token the stored buckets were built from.
    pub version: String,
    /// Unix timestamp of the rebuild that wrote this version.
    pub updated_at: i64,
}

/// A persisted association between a short id and a speaker set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMapping {
    pub id: String,
    /// Deduplicated and sorted.
    pub speakers: Vec<String>,
}

impl IdMapping {
    /// Unambiguous lookup key for the speaker set (a JSON array string).
    pub fn speakers_key(&self) -> String {
        speakers_key(&self.speakers)
    }
}

/// Encode a canonical (sorted, deduplicated) speaker list as a lookup key.
///
/// JSON keeps names containing commas or quotes from colliding.
pub fn speakers_key(speakers: &[String]) -> String {
    serde_json::to_string(speakers).unwrap_or_else(|_| speakers.join("\u{1f}"))
}

/// One row of the speaker listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakerCount {
    pub count: i64,
    pub speaker: String,
}

/// Summary of what the store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub speakers: i64,
    pub talks: i64,
    pub id_mappings: i64,
    pub version: Option<String>,
}
