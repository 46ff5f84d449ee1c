// src/query.rs
//! Read-side composition over the repository: listings, search, and the
//! engagement counter operations. This is the surface the HTTP shell
//! consumes; it enforces result caps and default ordering.

use std::cmp::Ordering;
use std::sync::Arc;

use strsim::normalized_levenshtein;

use crate::error::RepoError;
use crate::model::{Article, Category, CounterKind, Region};
use crate::repo::{ArticleRepository, ListFilter, OrderBy};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Clone)]
pub struct QueryService {
    repo: Arc<dyn ArticleRepository>,
}

impl QueryService {
    pub fn new(repo: Arc<dyn ArticleRepository>) -> Self {
        Self { repo }
    }

    fn cap(limit: Option<usize>) -> usize {
        limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub async fn list(
        &self,
        category: Option<Category>,
        region: Option<Region>,
        order: OrderBy,
        limit: Option<usize>,
    ) -> Result<Vec<Article>, RepoError> {
        self.repo
            .list(ListFilter {
                category,
                region,
                order,
                limit: Self::cap(limit),
            })
            .await
    }

    pub async fn list_trending(&self, limit: Option<usize>) -> Result<Vec<Article>, RepoError> {
        self.list(None, None, OrderBy::Trending, limit).await
    }

    pub async fn list_by_category(
        &self,
        category: Category,
        limit: Option<usize>,
    ) -> Result<Vec<Article>, RepoError> {
        self.list(Some(category), None, OrderBy::Trending, limit).await
    }

    pub async fn list_by_region(
        &self,
        region: Region,
        limit: Option<usize>,
    ) -> Result<Vec<Article>, RepoError> {
        self.list(None, Some(region), OrderBy::Trending, limit).await
    }

    /// Search: the repository narrows by substring match; relevance of
    /// the query against the title orders the page, trending score
    /// breaks ties.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Article>, RepoError> {
        let rows = self.repo.search_text(query, Self::cap(limit)).await?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(rows);
        }

        let mut keyed: Vec<(f64, Article)> = rows
            .into_iter()
            .map(|a| {
                let relevance = normalized_levenshtein(&needle, &a.title.to_lowercase());
                (relevance, a)
            })
            .collect();
        keyed.sort_by(|(ra, a), (rb, b)| {
            rb.partial_cmp(ra).unwrap_or(Ordering::Equal).then_with(|| {
                b.trending_score
                    .partial_cmp(&a.trending_score)
                    .unwrap_or(Ordering::Equal)
            })
        });
        Ok(keyed.into_iter().map(|(_, a)| a).collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<Article>, RepoError> {
        self.repo.get(id).await
    }

    pub async fn record_view(&self, id: u64) -> Result<u64, RepoError> {
        self.repo.increment_counter(id, CounterKind::Views, 1).await
    }

    pub async fn record_share(&self, id: u64) -> Result<u64, RepoError> {
        self.repo.increment_counter(id, CounterKind::Shares, 1).await
    }
}
