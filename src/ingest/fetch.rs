// src/ingest/fetch.rs
//! Feed transport: a small client seam so tests can stub the network,
//! plus bounded retry with exponential backoff around the real HTTP
//! client. A source that exhausts its retries is skipped for the cycle;
//! it never delays its siblings beyond its own bounded attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::model::Source;

#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch the raw feed document for one url.
    async fn fetch(&self, url: &str) -> Result<String, IngestError>;
}

pub struct HttpFeedClient {
    client: reqwest::Client,
}

impl HttpFeedClient {
    /// `timeout` bounds each individual request, including retries'
    /// individual attempts.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ghana-news-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

/// Doubling backoff from the configured base, capped at 30s.
fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let ms = base_ms.saturating_mul(1u64 << attempt.min(6));
    Duration::from_millis(ms.min(30_000))
}

/// Fetch one source with up to `retry_attempts` retries.
pub async fn fetch_with_retry(
    client: &Arc<dyn FeedClient>,
    source: &Source,
    cfg: &IngestConfig,
) -> Result<String, IngestError> {
    let mut attempt: u32 = 0;
    loop {
        match client.fetch(&source.url).await {
            Ok(body) => return Ok(body),
            Err(err) if attempt < cfg.retry_attempts => {
                let delay = backoff_delay(attempt, cfg.retry_base_ms);
                warn!(
                    source = %source.name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "fetch failed; backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
