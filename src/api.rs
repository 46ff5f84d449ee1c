// src/api.rs
// Thin HTTP shell over the query service. The pipeline itself never
// depends on this module; it exists to expose the read contracts.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::RepoError;
use crate::model::{Article, Category, Region};
use crate::query::QueryService;
use crate::repo::OrderBy;
use crate::sources::SourceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
    pub registry: Arc<SourceRegistry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/{id}", get(get_article))
        .route("/api/articles/{id}/view", post(record_view))
        .route("/api/articles/{id}/share", post(record_share))
        .route("/api/search", get(search))
        .route("/api/trending", get(trending))
        .route("/api/categories", get(categories))
        .route("/admin/reload-sources", get(reload_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn status_for(err: RepoError) -> StatusCode {
    match err {
        RepoError::NotFound(_) => StatusCode::NOT_FOUND,
        RepoError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// `category=all` / `region=all` mean "no filter", matching the
/// original client contract.
fn parse_category(raw: Option<&str>) -> Result<Option<Category>, StatusCode> {
    match raw {
        None | Some("all") | Some("") => Ok(None),
        Some(s) => Category::parse(s).map(Some).ok_or(StatusCode::BAD_REQUEST),
    }
}

fn parse_region(raw: Option<&str>) -> Result<Option<Region>, StatusCode> {
    match raw {
        None | Some("all") | Some("") => Ok(None),
        Some(s) => Region::parse(s).map(Some).ok_or(StatusCode::BAD_REQUEST),
    }
}

fn parse_sort(raw: Option<&str>) -> Result<OrderBy, StatusCode> {
    match raw {
        None | Some("trending") => Ok(OrderBy::Trending),
        Some("recent") | Some("recency") => Ok(OrderBy::Recency),
        Some(_) => Err(StatusCode::BAD_REQUEST),
    }
}

#[derive(Deserialize)]
struct ListParams {
    category: Option<String>,
    region: Option<String>,
    sort: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ArticlesResponse {
    articles: Vec<Article>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<ArticlesResponse>, StatusCode> {
    let category = parse_category(p.category.as_deref())?;
    let region = parse_region(p.region.as_deref())?;
    let order = parse_sort(p.sort.as_deref())?;
    let articles = state
        .service
        .list(category, region, order, p.limit)
        .await
        .map_err(status_for)?;
    Ok(Json(ArticlesResponse { articles }))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Article>, StatusCode> {
    // A detail read counts as a view, as the original backend had it.
    state.service.record_view(id).await.map_err(status_for)?;
    let article = state
        .service
        .get(id)
        .await
        .map_err(status_for)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(article))
}

#[derive(Serialize)]
struct CounterResponse {
    id: u64,
    count: u64,
}

async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CounterResponse>, StatusCode> {
    let count = state.service.record_view(id).await.map_err(status_for)?;
    Ok(Json(CounterResponse { id, count }))
}

async fn record_share(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CounterResponse>, StatusCode> {
    let count = state.service.record_share(id).await.map_err(status_for)?;
    Ok(Json(CounterResponse { id, count }))
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<Article>,
}

async fn search(
    State(state): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<SearchResponse>, StatusCode> {
    let q = p.q.unwrap_or_default();
    let results = state
        .service
        .search(&q, p.limit)
        .await
        .map_err(status_for)?;
    Ok(Json(SearchResponse { results }))
}

#[derive(Deserialize)]
struct TrendingParams {
    limit: Option<usize>,
}

async fn trending(
    State(state): State<AppState>,
    Query(p): Query<TrendingParams>,
) -> Result<Json<ArticlesResponse>, StatusCode> {
    let articles = state
        .service
        .list_trending(p.limit)
        .await
        .map_err(status_for)?;
    Ok(Json(ArticlesResponse { articles }))
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<&'static str>,
}

async fn categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: Category::ALL.iter().map(|c| c.as_str()).collect(),
    })
}

async fn reload_sources(State(state): State<AppState>) -> String {
    match state.registry.reload() {
        Ok(n) => format!("reloaded {n} sources"),
        Err(err) => format!("reload failed: {err}"),
    }
}
