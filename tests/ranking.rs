// tests/ranking.rs
//
// The rescore pass over a repository: idempotence at a fixed clock,
// ordering after recompute, and isolation of per-article failures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ghana_news_aggregator::error::RepoError;
use ghana_news_aggregator::model::{Article, ArticleDraft, Category, CounterKind, Region};
use ghana_news_aggregator::rank::{run_rescore, RankingConfig};
use ghana_news_aggregator::repo::{
    ArticleRepository, ListFilter, MemoryRepository, UpsertOutcome,
};

fn draft(title: &str, published_at: DateTime<Utc>) -> ArticleDraft {
    ArticleDraft {
        title: title.to_string(),
        summary: String::new(),
        url: "https://example.test/story".into(),
        image_url: None,
        source_id: "src".into(),
        source_name: "Source".into(),
        region: Region::Ghana,
        category: Category::General,
        published_at,
        affiliates: HashMap::new(),
    }
}

async fn insert(repo: &Arc<dyn ArticleRepository>, title: &str, published_at: DateTime<Utc>) -> u64 {
    match repo
        .upsert(draft(title, published_at), title, 0.0)
        .await
        .unwrap()
    {
        UpsertOutcome::Inserted(id) => id,
        other => panic!("expected Inserted, got {other:?}"),
    }
}

#[tokio::test]
async fn rescore_is_idempotent_at_a_fixed_clock() {
    let repo: Arc<dyn ArticleRepository> = Arc::new(MemoryRepository::new());
    let now = Utc::now();
    let id = insert(&repo, "story", now - Duration::hours(3)).await;
    repo.increment_counter(id, CounterKind::Views, 10).await.unwrap();

    let cfg = RankingConfig::default();
    run_rescore(&repo, &cfg, now).await.unwrap();
    let first = repo.get(id).await.unwrap().unwrap().trending_score;
    run_rescore(&repo, &cfg, now).await.unwrap();
    let second = repo.get(id).await.unwrap().unwrap().trending_score;

    assert_eq!(first, second);
}

#[tokio::test]
async fn fresh_engaged_article_outranks_stale_ignored_one() {
    let repo: Arc<dyn ArticleRepository> = Arc::new(MemoryRepository::new());
    let now = Utc::now();

    // Window is widened so the ten-day-old article still gets rescored.
    let cfg = RankingConfig {
        rescore_window_hours: 24 * 30,
        ..RankingConfig::default()
    };

    let stale = insert(&repo, "stale", now - Duration::days(10)).await;
    let fresh = insert(&repo, "fresh", now - Duration::hours(1)).await;
    repo.increment_counter(fresh, CounterKind::Views, 1000).await.unwrap();
    repo.increment_counter(fresh, CounterKind::Shares, 200).await.unwrap();

    run_rescore(&repo, &cfg, now).await.unwrap();

    let stale_score = repo.get(stale).await.unwrap().unwrap().trending_score;
    let fresh_score = repo.get(fresh).await.unwrap().unwrap().trending_score;
    assert!(fresh_score > stale_score);
}

#[tokio::test]
async fn articles_outside_the_window_keep_their_score() {
    let repo: Arc<dyn ArticleRepository> = Arc::new(MemoryRepository::new());
    let now = Utc::now();
    let cfg = RankingConfig::default(); // 72h window

    let old = insert(&repo, "old", now - Duration::days(10)).await;
    repo.set_trending_score(old, 42.0).await.unwrap();

    let updated = run_rescore(&repo, &cfg, now).await.unwrap();
    assert_eq!(updated, 0);
    assert_eq!(repo.get(old).await.unwrap().unwrap().trending_score, 42.0);
}

/// Delegates to a real repository but refuses score writes for one id,
/// standing in for a row-level storage hiccup.
struct FlakyScoreRepo {
    inner: MemoryRepository,
    bad_id: std::sync::atomic::AtomicU64,
}

#[async_trait]
impl ArticleRepository for FlakyScoreRepo {
    async fn upsert(
        &self,
        draft: ArticleDraft,
        fingerprint: &str,
        initial_score: f64,
    ) -> Result<UpsertOutcome, RepoError> {
        self.inner.upsert(draft, fingerprint, initial_score).await
    }

    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, RepoError> {
        self.inner.contains_fingerprint(fingerprint).await
    }

    async fn get(&self, id: u64) -> Result<Option<Article>, RepoError> {
        self.inner.get(id).await
    }

    async fn increment_counter(
        &self,
        id: u64,
        kind: CounterKind,
        delta: u64,
    ) -> Result<u64, RepoError> {
        self.inner.increment_counter(id, kind, delta).await
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<Article>, RepoError> {
        self.inner.list(filter).await
    }

    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Article>, RepoError> {
        self.inner.search_text(query, limit).await
    }

    async fn published_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Article>, RepoError> {
        self.inner.published_since(cutoff).await
    }

    async fn set_trending_score(&self, id: u64, score: f64) -> Result<(), RepoError> {
        if id == self.bad_id.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(RepoError::Unavailable("row write refused".into()));
        }
        self.inner.set_trending_score(id, score).await
    }
}

#[tokio::test]
async fn one_failed_score_write_does_not_abort_the_batch() {
    let flaky = Arc::new(FlakyScoreRepo {
        inner: MemoryRepository::new(),
        bad_id: std::sync::atomic::AtomicU64::new(0),
    });
    let repo: Arc<dyn ArticleRepository> = flaky.clone();
    let now = Utc::now();

    let a = insert(&repo, "a", now - Duration::hours(1)).await;
    let b = insert(&repo, "b", now - Duration::hours(2)).await;
    flaky.bad_id.store(a, std::sync::atomic::Ordering::Relaxed);

    let updated = run_rescore(&repo, &RankingConfig::default(), now).await.unwrap();
    assert_eq!(updated, 1);

    // The healthy row was rescored; the refused one kept its insert-time score.
    let b_score = repo.get(b).await.unwrap().unwrap().trending_score;
    assert!(b_score > 0.0);
}
