// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use ghana_news_aggregator::api::{self, AppState};
use ghana_news_aggregator::dedup::fingerprint;
use ghana_news_aggregator::model::{ArticleDraft, Category, Region};
use ghana_news_aggregator::query::QueryService;
use ghana_news_aggregator::repo::{ArticleRepository, MemoryRepository, UpsertOutcome};
use ghana_news_aggregator::sources::{seed_sources, SourceRegistry};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn draft(title: &str, category: Category, score_hint: f64) -> (ArticleDraft, f64) {
    let d = ArticleDraft {
        title: title.to_string(),
        summary: format!("summary for {title}"),
        url: "https://example.test/story".into(),
        image_url: None,
        source_id: "citinews".into(),
        source_name: "CitiNews".into(),
        region: Region::Ghana,
        category,
        published_at: Utc::now() - Duration::hours(1),
        affiliates: HashMap::new(),
    };
    (d, score_hint)
}

/// Build the same Router the binary uses, over a seeded repository.
/// Returns the router and the id of the politics article.
async fn test_router() -> (Router, u64) {
    let repo: Arc<dyn ArticleRepository> = Arc::new(MemoryRepository::new());

    let (d, score) = draft("Parliament Passes New Budget", Category::Politics, 5.0);
    let id = match repo.upsert(d, &fingerprint("Parliament Passes New Budget"), score)
        .await
        .unwrap()
    {
        UpsertOutcome::Inserted(id) => id,
        other => panic!("expected Inserted, got {other:?}"),
    };

    let (d, score) = draft("Black Stars Name Squad", Category::Sports, 2.0);
    repo.upsert(d, &fingerprint("Black Stars Name Squad"), score)
        .await
        .unwrap();

    let state = AppState {
        service: QueryService::new(repo),
        registry: Arc::new(SourceRegistry::from_sources(seed_sources())),
    };
    (api::router(state), id)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200() {
    let (app, _) = test_router().await;
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_articles_lists_and_filters_by_category() {
    let (app, _) = test_router().await;
    let (status, v) = get_json(app, "/api/articles?category=politics").await;
    assert_eq!(status, StatusCode::OK);

    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["category"], "politics");
    assert_eq!(articles[0]["source"], "CitiNews");
}

#[tokio::test]
async fn api_trending_orders_by_score() {
    let (app, _) = test_router().await;
    let (status, v) = get_json(app, "/api/trending").await;
    assert_eq!(status, StatusCode::OK);
    let articles = v["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0]["title"], "Parliament Passes New Budget");
}

#[tokio::test]
async fn api_article_detail_counts_a_view() {
    let (app, id) = test_router().await;

    let (status, first) = get_json(app.clone(), &format!("/api/articles/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["views"], 1);

    let (_, second) = get_json(app, &format!("/api/articles/{id}")).await;
    assert_eq!(second["views"], 2);
}

#[tokio::test]
async fn api_share_increments_and_unknown_id_is_404() {
    let (app, id) = test_router().await;

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/articles/{id}/share"))
        .body(Body::empty())
        .expect("build POST share");
    let resp = app.clone().oneshot(req).await.expect("oneshot share");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["count"], 1);

    let req = Request::builder()
        .method("POST")
        .uri("/api/articles/999999/share")
        .body(Body::empty())
        .expect("build POST share unknown");
    let resp = app.oneshot(req).await.expect("oneshot share unknown");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_search_contract() {
    let (app, _) = test_router().await;

    // Missing q behaves like an empty query: empty results, 200.
    let (status, v) = get_json(app.clone(), "/api/search").await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["results"].as_array().unwrap().is_empty());

    let (_, v) = get_json(app, "/api/search?q=budget").await;
    let results = v["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Parliament Passes New Budget");
}

#[tokio::test]
async fn api_unknown_category_is_bad_request() {
    let (app, _) = test_router().await;
    let (status, _) = get_json(app, "/api/articles?category=weather").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_categories_lists_the_taxonomy() {
    let (app, _) = test_router().await;
    let (status, v) = get_json(app, "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    let cats = v["categories"].as_array().unwrap();
    assert_eq!(cats.len(), 8);
    assert!(cats.iter().any(|c| c == "general"));
}
