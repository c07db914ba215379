//! Directory catalog.
//!
//! Serves the catalog from JSON files on disk, for offline runs and
//! fixtures:
//!
//! ```text
//! <path>/version.json        { "version": "..." }
//! <path>/1999-04.json        { "talks": [...] }
//! <path>/1999-10.json
//! ```
//!
//! A period without a file is reported as [`FetchError::Missing`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use speakercast_core::catalog::Catalog;
use speakercast_core::error::FetchError;
use speakercast_core::models::RawTalkRecord;
use speakercast_core::period::Period;

use crate::catalog::{ListingDocument, VersionDocument};

pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn period_path(&self, period: Period) -> PathBuf {
        self.root
            .join(format!("{}-{:02}.json", period.year, period.month()))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FetchError> {
        let target = path.display().to_string();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchError::Transport {
                target: target.clone(),
                message: e.to_string(),
            })?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode {
            target,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Catalog for DirectoryCatalog {
    fn name(&self) -> &str {
        "directory"
    }

    async fn current_version(&self) -> Result<String, FetchError> {
        let doc: VersionDocument = Self::read_json(&self.root.join("version.json")).await?;
        Ok(doc.version.into_string())
    }

    async fn fetch(&self, period: Period) -> Result<Vec<RawTalkRecord>, FetchError> {
        let path = self.period_path(period);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(FetchError::Missing(period));
        }
        let doc: ListingDocument = Self::read_json(&path).await?;
        Ok(doc.into_records(&path.display().to_string()))
    }
}
