// src/model.rs
//! Canonical records shared across the pipeline: configured sources,
//! in-flight drafts, and persisted articles.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A configured syndication feed. Sources are never deleted, only
/// deactivated, so provenance on already-ingested articles stays
/// meaningful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub url: String,
    pub region: Region,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Closed region taxonomy. Anything a config file invents beyond the
/// known set folds into `Other`, which keeps downstream matching
/// exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Ghana,
    Africa,
    Global,
    Other,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Ghana, Region::Africa, Region::Global, Region::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Ghana => "ghana",
            Region::Africa => "africa",
            Region::Global => "global",
            Region::Other => "other",
        }
    }

    /// Exact (case-insensitive) match against the known set.
    pub fn parse(s: &str) -> Option<Region> {
        match s.to_ascii_lowercase().as_str() {
            "ghana" => Some(Region::Ghana),
            "africa" => Some(Region::Africa),
            "global" => Some(Region::Global),
            "other" => Some(Region::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown region tags in config fall back to `Other` instead of
// rejecting the whole source list.
impl<'de> Deserialize<'de> for Region {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Region::parse(&s).unwrap_or(Region::Other))
    }
}

/// Closed category taxonomy with `General` as the classifier fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Business,
    Sports,
    Tech,
    Health,
    Entertainment,
    World,
    General,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Politics,
        Category::Business,
        Category::Sports,
        Category::Tech,
        Category::Health,
        Category::Entertainment,
        Category::World,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Business => "business",
            Category::Sports => "sports",
            Category::Tech => "tech",
            Category::Health => "health",
            Category::Entertainment => "entertainment",
            Category::World => "world",
            Category::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        let lower = s.to_ascii_lowercase();
        Category::ALL.iter().copied().find(|c| c.as_str() == lower)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized candidate article, produced per fetch cycle and
/// consumed by the deduplicator/repository. Never persisted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source_id: String,
    pub source_name: String,
    pub region: Region,
    pub category: Category,
    pub published_at: DateTime<Utc>,
    pub affiliates: HashMap<String, String>,
}

/// The persisted record. `source` denormalizes the source name at
/// ingestion time; a later source rename does not rewrite history.
/// `trending_score` is written only by the ranking engine (and by the
/// same pure function once, at insert).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub fingerprint: String,
    pub summary: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source: String,
    pub region: Region,
    pub category: Category,
    pub published_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub views: u64,
    pub shares: u64,
    pub trending_score: f64,
    pub affiliates: HashMap<String, String>,
    pub seo_score: f64,
}

/// Which engagement counter a read-side event bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Views,
    Shares,
}
