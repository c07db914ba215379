//! HTTP catalog.
//!
//! Reads the catalog over HTTP with a shared `reqwest::Client`:
//!
//! | Request | Document |
//! |---------|----------|
//! | `GET {base_url}/version` | version document |
//! | `GET {base_url}/general-conference/{year}/{month:02}?lang={lang}` | listing document |
//!
//! See [`crate::catalog`] for the document shapes.
//!
//! # Configuration
//!
//! ```toml
//! [catalog]
//! type = "http"
//! base_url = "https://catalog.example.org"
//! lang = "eng"
//! timeout_secs = 30
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use speakercast_core::catalog::Catalog;
use speakercast_core::error::FetchError;
use speakercast_core::models::RawTalkRecord;
use speakercast_core::period::Period;

use crate::catalog::{ListingDocument, VersionDocument};

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    lang: String,
}

impl HttpCatalog {
    pub fn new(base_url: &str, lang: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
        })
    }

    pub fn version_url(&self) -> String {
        format!("{}/version", self.base_url)
    }

    pub fn period_url(&self, period: Period) -> String {
        format!(
            "{}/general-conference/{}/{:02}?lang={}",
            self.base_url,
            period.year,
            period.month(),
            self.lang
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url, "GET");
        let transport = |e: reqwest::Error| FetchError::Transport {
            target: url.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Decode {
                    target: url.to_string(),
                    message: e.to_string(),
                }
            } else {
                transport(e)
            }
        })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    fn name(&self) -> &str {
        "http"
    }

    async fn current_version(&self) -> Result<String, FetchError> {
        let doc: VersionDocument = self.get_json(&self.version_url()).await?;
        Ok(doc.version.into_string())
    }

    async fn fetch(&self, period: Period) -> Result<Vec<RawTalkRecord>, FetchError> {
        let url = self.period_url(period);
        let doc: ListingDocument = self.get_json(&url).await?;
        Ok(doc.into_records(&url))
    }
}
