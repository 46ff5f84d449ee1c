// src/config.rs
//! Runtime tunables, loaded from `config/aggregator.toml` (path
//! overridable via NEWS_CONFIG_PATH). Every field has a default so a
//! missing or partial file still boots.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::rank::RankingConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";
pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub poll_interval_secs: u64,
    /// Maximum concurrent feed fetches per cycle.
    pub max_in_flight: usize,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_base_ms: u64,
    pub max_entries_per_feed: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            max_in_flight: 4,
            request_timeout_secs: 10,
            retry_attempts: 3,
            retry_base_ms: 500,
            max_entries_per_feed: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub ranking: RankingConfig,
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config from {}", path.display()))
    }

    /// Env override, then the default path, then built-in defaults.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                info!(path = %path.display(), error = %err, "config not loaded; using defaults");
                Self::default()
            }
        }
    }
}
