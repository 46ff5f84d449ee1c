// src/sources.rs
//! # Feed Registry
//! The configured source list. Sources are never removed, only
//! deactivated, so provenance on already-ingested articles stays
//! meaningful.
//!
//! Load order: $NEWS_SOURCES_PATH, then `config/sources.toml`, then the
//! embedded seed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::model::{Region, Source};

pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";
pub const ENV_SOURCES_PATH: &str = "NEWS_SOURCES_PATH";

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<Source>,
}

#[derive(Debug)]
pub struct SourceRegistry {
    inner: RwLock<Vec<Source>>,
    path: Option<PathBuf>,
}

impl SourceRegistry {
    pub fn from_sources(sources: Vec<Source>) -> Self {
        Self {
            inner: RwLock::new(sources),
            path: None,
        }
    }

    /// Load from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources from {}", path.display()))?;
        let file: SourcesFile = toml::from_str(&content)
            .with_context(|| format!("parsing sources from {}", path.display()))?;
        Ok(Self {
            inner: RwLock::new(file.sources),
            path: Some(path.to_path_buf()),
        })
    }

    /// Env override, then the default path, then the embedded seed.
    pub fn load_default() -> Self {
        if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
            let pb = PathBuf::from(p);
            match Self::load_from(&pb) {
                Ok(reg) => return reg,
                Err(err) => info!(path = %pb.display(), error = %err, "sources env path unusable"),
            }
        }
        let default = PathBuf::from(DEFAULT_SOURCES_PATH);
        if default.exists() {
            if let Ok(reg) = Self::load_from(&default) {
                return reg;
            }
        }
        info!("no sources file found; using embedded seed");
        Self::from_sources(seed_sources())
    }

    /// Active sources as of now; the scheduler takes this snapshot at
    /// the start of every cycle.
    pub fn snapshot_active(&self) -> Vec<Source> {
        self.inner
            .read()
            .expect("source registry lock poisoned")
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Source> {
        self.inner
            .read()
            .expect("source registry lock poisoned")
            .clone()
    }

    /// Toggle activation; returns false when the id is unknown.
    pub fn set_active(&self, id: &str, active: bool) -> bool {
        let mut sources = self.inner.write().expect("source registry lock poisoned");
        match sources.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.active = active;
                true
            }
            None => false,
        }
    }

    /// Re-read the backing file, replacing the in-memory list.
    pub fn reload(&self) -> Result<usize> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| anyhow!("registry has no backing file"))?;
        let fresh = Self::load_from(&path)?.all();
        let mut sources = self.inner.write().expect("source registry lock poisoned");
        *sources = fresh;
        Ok(sources.len())
    }
}

/// The original deployment's feed set; keeps the service useful with
/// zero configuration.
pub fn seed_sources() -> Vec<Source> {
    let mk = |id: &str, name: &str, url: &str, region: Region| Source {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        region,
        active: true,
        created_at: Utc::now(),
    };
    vec![
        mk("citinews", "CitiNews", "https://citinewsroom.com/feed/", Region::Ghana),
        mk("joyonline", "JoyOnline", "https://www.myjoyonline.com/feed/", Region::Ghana),
        mk(
            "ghanaweb",
            "GhanaWeb",
            "https://www.ghanaweb.com/GhanaHomePage/rss/index.php",
            Region::Ghana,
        ),
        mk(
            "graphic",
            "Graphic Online",
            "https://www.graphic.com.gh/feed/rss",
            Region::Ghana,
        ),
        mk(
            "gbn",
            "GhanaBusinessNews",
            "https://www.ghanabusinessnews.com/feed/",
            Region::Ghana,
        ),
        mk(
            "bbc-africa",
            "BBC Africa",
            "http://feeds.bbci.co.uk/news/world/africa/rss.xml",
            Region::Africa,
        ),
        mk(
            "reuters-africa",
            "Reuters Africa",
            "https://feeds.reuters.com/reuters/AFRICANews",
            Region::Africa,
        ),
        mk(
            "aljazeera",
            "Al Jazeera",
            "https://www.aljazeera.com/xml/rss/all.xml",
            Region::Global,
        ),
    ]
}
