//! News Aggregator — Binary Entrypoint
//! Boots the Axum HTTP server and the two background jobs: the feed
//! poll scheduler and the trending rescore job.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ghana_news_aggregator::api::{self, AppState};
use ghana_news_aggregator::config::AppConfig;
use ghana_news_aggregator::ingest::fetch::{FeedClient, HttpFeedClient};
use ghana_news_aggregator::ingest::scheduler::spawn_ingest_scheduler;
use ghana_news_aggregator::metrics::Metrics;
use ghana_news_aggregator::query::QueryService;
use ghana_news_aggregator::rank::spawn_rescore_job;
use ghana_news_aggregator::repo::{ArticleRepository, MemoryRepository};
use ghana_news_aggregator::sources::SourceRegistry;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ingest=info,rank=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::load_default();
    let registry = Arc::new(SourceRegistry::load_default());
    let repo: Arc<dyn ArticleRepository> = Arc::new(MemoryRepository::new());

    let metrics = Metrics::init(cfg.ingest.poll_interval_secs, cfg.ranking.interval_secs);

    let client: Arc<dyn FeedClient> = Arc::new(
        HttpFeedClient::new(Duration::from_secs(cfg.ingest.request_timeout_secs))
            .expect("build feed http client"),
    );

    // Background jobs run detached for the life of the service; the
    // tasks keep their own cancellation channels open.
    let _ingest = spawn_ingest_scheduler(
        Arc::clone(&registry),
        client,
        Arc::clone(&repo),
        cfg.ingest,
        cfg.ranking,
    );
    let _rescore = spawn_rescore_job(Arc::clone(&repo), cfg.ranking);

    let state = AppState {
        service: QueryService::new(repo),
        registry,
    };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
