// src/repo.rs
//! # Repository
//! The persistence boundary. The repository is the only mutable state
//! shared across concurrent fetchers, and every mutation is an atomic,
//! conflict-resolving operation (upsert-by-unique-fingerprint, counter
//! bump), so callers never need locking of their own.
//!
//! `MemoryRepository` is the in-process engine behind the trait; a real
//! database with a unique index satisfies the same contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RepoError;
use crate::model::{Article, ArticleDraft, Category, CounterKind, Region};

/// Outcome of a fingerprint-keyed insert. Under a race on one
/// fingerprint exactly one caller sees `Inserted`; everyone else sees
/// `AlreadyExists`. Neither is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(u64),
    AlreadyExists(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Recency,
    Trending,
}

#[derive(Debug, Clone, Copy)]
pub struct ListFilter {
    pub category: Option<Category>,
    pub region: Option<Region>,
    pub order: OrderBy,
    pub limit: usize,
}

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Atomic insert keyed on the unique title fingerprint. This is the
    /// authoritative dedup boundary; the deduplicator's advisory check
    /// is an optimization in front of it.
    async fn upsert(
        &self,
        draft: ArticleDraft,
        fingerprint: &str,
        initial_score: f64,
    ) -> Result<UpsertOutcome, RepoError>;

    /// Advisory existence check for the dedup pre-filter.
    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, RepoError>;

    async fn get(&self, id: u64) -> Result<Option<Article>, RepoError>;

    /// Monotonic counter bump; returns the new value. Unknown ids are a
    /// `NotFound`, never a crash.
    async fn increment_counter(
        &self,
        id: u64,
        kind: CounterKind,
        delta: u64,
    ) -> Result<u64, RepoError>;

    async fn list(&self, filter: ListFilter) -> Result<Vec<Article>, RepoError>;

    /// Case-insensitive substring match over title and summary, ranked
    /// by trending score descending then recency descending. A blank
    /// query matches nothing (empty result, not an error).
    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Article>, RepoError>;

    /// Articles published at or after `cutoff`, for rescoring.
    async fn published_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Article>, RepoError>;

    /// Written only by the ranking engine.
    async fn set_trending_score(&self, id: u64, score: f64) -> Result<(), RepoError>;
}

#[derive(Debug, Default)]
struct Inner {
    articles: HashMap<u64, Article>,
    by_fingerprint: HashMap<String, u64>,
}

/// In-memory engine. One write lock covers check-and-insert and counter
/// bumps, which is all the uniqueness and monotonicity contracts need.
#[derive(Debug)]
pub struct MemoryRepository {
    next_id: AtomicU64,
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            inner: RwLock::new(Inner::default()),
        }
    }

    // Poisoning means a writer panicked mid-mutation; surface it as the
    // storage being unavailable rather than unwinding into callers.
    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, RepoError> {
        self.inner
            .read()
            .map_err(|_| RepoError::Unavailable("article store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, RepoError> {
        self.inner
            .write()
            .map_err(|_| RepoError::Unavailable("article store lock poisoned".into()))
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn by_trending_then_recency(a: &Article, b: &Article) -> std::cmp::Ordering {
    b.trending_score
        .partial_cmp(&a.trending_score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| b.published_at.cmp(&a.published_at))
}

#[async_trait]
impl ArticleRepository for MemoryRepository {
    async fn upsert(
        &self,
        draft: ArticleDraft,
        fingerprint: &str,
        initial_score: f64,
    ) -> Result<UpsertOutcome, RepoError> {
        let mut inner = self.write()?;
        if let Some(&id) = inner.by_fingerprint.get(fingerprint) {
            return Ok(UpsertOutcome::AlreadyExists(id));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let article = Article {
            id,
            title: draft.title,
            fingerprint: fingerprint.to_string(),
            summary: draft.summary,
            url: draft.url,
            image_url: draft.image_url,
            source: draft.source_name,
            region: draft.region,
            category: draft.category,
            published_at: draft.published_at,
            ingested_at: Utc::now(),
            views: 0,
            shares: 0,
            trending_score: initial_score,
            affiliates: draft.affiliates,
            seo_score: 0.0,
        };
        inner.by_fingerprint.insert(fingerprint.to_string(), id);
        inner.articles.insert(id, article);
        Ok(UpsertOutcome::Inserted(id))
    }

    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, RepoError> {
        Ok(self.read()?.by_fingerprint.contains_key(fingerprint))
    }

    async fn get(&self, id: u64) -> Result<Option<Article>, RepoError> {
        Ok(self.read()?.articles.get(&id).cloned())
    }

    async fn increment_counter(
        &self,
        id: u64,
        kind: CounterKind,
        delta: u64,
    ) -> Result<u64, RepoError> {
        let mut inner = self.write()?;
        let article = inner.articles.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        let slot = match kind {
            CounterKind::Views => &mut article.views,
            CounterKind::Shares => &mut article.shares,
        };
        *slot = slot.saturating_add(delta);
        Ok(*slot)
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<Article>, RepoError> {
        let mut rows: Vec<Article> = {
            let inner = self.read()?;
            inner
                .articles
                .values()
                .filter(|a| filter.category.map_or(true, |c| a.category == c))
                .filter(|a| filter.region.map_or(true, |r| a.region == r))
                .cloned()
                .collect()
        };

        match filter.order {
            OrderBy::Recency => rows.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
            OrderBy::Trending => rows.sort_by(by_trending_then_recency),
        }
        rows.truncate(filter.limit);
        Ok(rows)
    }

    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Article>, RepoError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows: Vec<Article> = {
            let inner = self.read()?;
            inner
                .articles
                .values()
                .filter(|a| {
                    a.title.to_lowercase().contains(&needle)
                        || a.summary.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        };

        rows.sort_by(by_trending_then_recency);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn published_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Article>, RepoError> {
        Ok(self
            .read()?
            .articles
            .values()
            .filter(|a| a.published_at >= cutoff)
            .cloned()
            .collect())
    }

    async fn set_trending_score(&self, id: u64, score: f64) -> Result<(), RepoError> {
        let mut inner = self.write()?;
        let article = inner.articles.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        article.trending_score = score;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn draft(title: &str) -> ArticleDraft {
        ArticleDraft {
            title: title.to_string(),
            summary: "summary".to_string(),
            url: format!("https://example.test/{}", title.len()),
            image_url: None,
            source_id: "src".to_string(),
            source_name: "Source".to_string(),
            region: Region::Ghana,
            category: Category::General,
            published_at: Utc::now(),
            affiliates: Map::new(),
        }
    }

    #[tokio::test]
    async fn second_upsert_with_same_fingerprint_is_already_exists() {
        let repo = MemoryRepository::new();
        let first = repo.upsert(draft("a"), "fp-1", 0.1).await.unwrap();
        let id = match first {
            UpsertOutcome::Inserted(id) => id,
            other => panic!("expected Inserted, got {:?}", other),
        };
        let second = repo.upsert(draft("b"), "fp-1", 0.1).await.unwrap();
        assert_eq!(second, UpsertOutcome::AlreadyExists(id));
    }

    #[tokio::test]
    async fn counter_on_unknown_id_is_not_found() {
        let repo = MemoryRepository::new();
        let err = repo
            .increment_counter(42, CounterKind::Views, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(42)));
    }

    #[tokio::test]
    async fn blank_search_matches_nothing() {
        let repo = MemoryRepository::new();
        repo.upsert(draft("a"), "fp-1", 0.1).await.unwrap();
        assert!(repo.search_text("", 10).await.unwrap().is_empty());
        assert!(repo.search_text("   ", 10).await.unwrap().is_empty());
    }
}
