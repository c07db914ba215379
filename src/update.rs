//! Version-gated refresh of the speaker index.
//!
//! [`Updater::refresh_if_stale`] compares the catalog's version token with
//! the one recorded in the store and rebuilds only when they differ (or
//! when forced). The new token is written strictly after the rebuild has
//! committed, so a failed or interrupted rebuild leaves the previous
//! version recorded and the next call retries it.
//!
//! Refreshes are serialized per store through
//! [`Store::refresh_lock`]: a second caller, through this `Updater` or any
//! other one over the same store, waits for the running refresh and then
//! sees an up-to-date version.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use speakercast_core::canonical::Canonicalizer;
use speakercast_core::catalog::Catalog;
use speakercast_core::error::{FetchError, IngestionError};
use speakercast_core::models::DatabaseMetadata;
use speakercast_core::store::Store;

use crate::config::Config;
use crate::ingest::{self, IngestOptions, RebuildSummary};

/// A refresh did not complete. Previously committed data is still served.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("could not read catalog version: {0}")]
    Version(#[source] FetchError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}

/// Where the full historical range ends.
#[derive(Debug, Clone, Copy)]
pub enum RangeEnd {
    Fixed(i32, u32),
    /// The current month at the time of each refresh.
    Today,
}

/// Outcome of a refresh call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    UpToDate { version: String },
    Rebuilt { version: String, summary: RebuildSummary },
}

impl RefreshOutcome {
    pub fn rebuilt(&self) -> bool {
        matches!(self, RefreshOutcome::Rebuilt { .. })
    }
}

pub struct Updater {
    store: Arc<dyn Store>,
    catalog: Arc<dyn Catalog>,
    canonicalizer: Canonicalizer,
    start: (i32, u32),
    end: RangeEnd,
    options: IngestOptions,
}

impl Updater {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<dyn Catalog>,
        canonicalizer: Canonicalizer,
        start: (i32, u32),
        end: RangeEnd,
        options: IngestOptions,
    ) -> Self {
        Self {
            store,
            catalog,
            canonicalizer,
            start,
            end,
            options,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn Store>, catalog: Arc<dyn Catalog>) -> Self {
        let ingest = &config.ingest;
        let end = match (ingest.end_year, ingest.end_month) {
            (Some(year), Some(month)) => RangeEnd::Fixed(year, month),
            _ => RangeEnd::Today,
        };
        Self::new(
            store,
            catalog,
            Canonicalizer::new(&config.normalize.extra_speaker_prefixes),
            ingest.start(),
            end,
            IngestOptions::from(ingest),
        )
    }

    fn end(&self) -> (i32, u32) {
        match self.end {
            RangeEnd::Fixed(year, month) => (year, month),
            RangeEnd::Today => {
                use chrono::Datelike;
                let today = chrono::Local::now().date_naive();
                (today.year(), today.month())
            }
        }
    }

    /// Rebuild if the catalog version changed (or `force`), then record
    /// the version. Returns whether a rebuild happened.
    pub async fn refresh_if_stale(&self, force: bool) -> Result<bool, UpdateError> {
        Ok(self.refresh(force).await?.rebuilt())
    }

    /// Like [`refresh_if_stale`](Self::refresh_if_stale) with details.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, UpdateError> {
        let _running = self.store.refresh_lock().lock().await;

        let remote = self
            .catalog
            .current_version()
            .await
            .map_err(UpdateError::Version)?;
        let stored = self.store.metadata().await.map_err(UpdateError::Store)?;

        if !force {
            if let Some(meta) = &stored {
                if meta.version == remote {
                    info!(version = %remote, "speaker index is up to date");
                    return Ok(RefreshOutcome::UpToDate { version: remote });
                }
            }
        }
        info!(
            remote = %remote,
            stored = stored.as_ref().map(|m| m.version.as_str()).unwrap_or("<none>"),
            force,
            "refreshing speaker index"
        );

        let summary = ingest::rebuild(
            self.store.as_ref(),
            Arc::clone(&self.catalog),
            &self.canonicalizer,
            self.start,
            self.end(),
            self.options,
        )
        .await?;

        self.store
            .put_metadata(&DatabaseMetadata {
                version: remote.clone(),
                updated_at: chrono::Utc::now().timestamp(),
            })
            .await
            .map_err(UpdateError::Store)?;

        Ok(RefreshOutcome::Rebuilt {
            version: remote,
            summary,
        })
    }
}
