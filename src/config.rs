//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/speakercast.sqlite"
//!
//! [catalog]
//! type = "http"
//! base_url = "https://catalog.example.org"
//!
//! [ingest]
//! start_year = 1971
//! start_month = 4
//! concurrency = 10
//!
//! [ids]
//! length = 8
//! ```
//!
//! Every section except `[db]` and `[catalog]` is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub ids: IdsConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Where raw conference listings come from.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    Http {
        base_url: String,
        #[serde(default = "default_lang")]
        lang: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Directory { path: PathBuf },
}

fn default_lang() -> String {
    "eng".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// What to do when some periods fail to fetch.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort only when no period could be fetched.
    #[default]
    AllFailed,
    /// Abort as soon as one period fails.
    AnyFailed,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_start_month")]
    pub start_month: u32,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub end_month: Option<u32>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            start_month: default_start_month(),
            end_year: None,
            end_month: None,
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_start_year() -> i32 {
    1971
}
fn default_start_month() -> u32 {
    4
}
fn default_concurrency() -> usize {
    10
}

impl IngestConfig {
    pub fn start(&self) -> (i32, u32) {
        (self.start_year, self.start_month)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdsConfig {
    #[serde(default = "default_id_length")]
    pub length: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            length: default_id_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_id_length() -> usize {
    speakercast_core::registry::DEFAULT_ID_LENGTH
}
fn default_max_attempts() -> u32 {
    speakercast_core::registry::DEFAULT_MAX_ATTEMPTS
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NormalizeConfig {
    #[serde(default)]
    pub extra_speaker_prefixes: Vec<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let ingest = &config.ingest;
    if !(1..=12).contains(&ingest.start_month) {
        anyhow::bail!("ingest.start_month must be in 1..=12");
    }
    if let Some(month) = ingest.end_month {
        if !(1..=12).contains(&month) {
            anyhow::bail!("ingest.end_month must be in 1..=12");
        }
    }
    if ingest.end_month.is_some() != ingest.end_year.is_some() {
        anyhow::bail!("ingest.end_year and ingest.end_month must be set together");
    }
    if !(1..=64).contains(&ingest.concurrency) {
        anyhow::bail!("ingest.concurrency must be in 1..=64");
    }

    if !(4..=32).contains(&config.ids.length) {
        anyhow::bail!("ids.length must be in 4..=32");
    }
    if config.ids.max_attempts == 0 {
        anyhow::bail!("ids.max_attempts must be >= 1");
    }

    if let CatalogConfig::Http { base_url, .. } = &config.catalog {
        if base_url.trim().is_empty() {
            anyhow::bail!("catalog.base_url must not be empty");
        }
    }

    Ok(())
}
