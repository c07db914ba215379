//! Catalog construction and the JSON documents catalogs exchange.
//!
//! Both built-in catalogs speak the same format:
//!
//! ```json
//! { "version": "2024.10.3" }
//! ```
//!
//! ```json
//! { "talks": [
//!     { "title": "Faith", "speaker": "Elder A", "session": "Saturday Morning Session",
//!       "uri": "/general-conference/2024/04/faith", "url": "https://…",
//!       "preview": "…", "audio": { "url": "https://….mp3", "size": 123 } }
//! ] }
//! ```
//!
//! `audio` may be `null` or absent; such talks are later dropped.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use speakercast_core::catalog::Catalog;
use speakercast_core::models::RawTalkRecord;

use crate::catalog_fs::DirectoryCatalog;
use crate::catalog_http::HttpCatalog;
use crate::config::{CatalogConfig, Config};

/// Body of a version document. Numbers are accepted and stringified.
#[derive(Debug, Deserialize)]
pub struct VersionDocument {
    pub version: VersionToken,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VersionToken {
    Text(String),
    Number(serde_json::Number),
}

impl VersionToken {
    pub fn into_string(self) -> String {
        match self {
            VersionToken::Text(s) => s,
            VersionToken::Number(n) => n.to_string(),
        }
    }
}

/// Body of a per-period listing document.
///
/// Talks are kept as raw JSON until [`into_records`](Self::into_records),
/// so one malformed entry costs only itself and not its whole period.
#[derive(Debug, Deserialize)]
pub struct ListingDocument {
    #[serde(default)]
    pub talks: Vec<serde_json::Value>,
}

impl ListingDocument {
    /// Decode each talk on its own, skipping (and logging) the ones that
    /// are not talk objects at all.
    pub fn into_records(self, target: &str) -> Vec<RawTalkRecord> {
        let total = self.talks.len();
        let records: Vec<RawTalkRecord> = self
            .talks
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(target, index, error = %e, "skipping malformed talk");
                    None
                }
            })
            .collect();
        if records.len() < total {
            debug!(target, kept = records.len(), total, "listing decoded with rejects");
        }
        records
    }
}

/// Build the catalog selected by `[catalog]`.
pub fn build_catalog(config: &Config) -> Result<Arc<dyn Catalog>> {
    match &config.catalog {
        CatalogConfig::Http {
            base_url,
            lang,
            timeout_secs,
        } => Ok(Arc::new(HttpCatalog::new(base_url, lang, *timeout_secs)?)),
        CatalogConfig::Directory { path } => Ok(Arc::new(DirectoryCatalog::new(path.clone()))),
    }
}
