// src/rank.rs
//! # Ranking Engine
//! Pure trending-score function plus the periodic rescore job.
//!
//! `score = (w_v * views + w_s * shares + w_0) * 0.5^(age_h / half_life_h)`
//!
//! The baseline weight `w_0` keeps the score strictly decreasing in age
//! even for articles nobody has opened yet. All constants are tunable
//! configuration; the contract is monotonicity and determinism, not the
//! exact numbers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::RepoError;
use crate::repo::ArticleRepository;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub view_weight: f64,
    pub share_weight: f64,
    pub baseline_weight: f64,
    pub half_life_hours: f64,
    /// Articles published longer ago than this are not rescored; their
    /// last score fades by absence of updates.
    pub rescore_window_hours: i64,
    pub interval_secs: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            view_weight: 0.6,
            share_weight: 0.3,
            baseline_weight: 0.1,
            half_life_hours: 24.0,
            rescore_window_hours: 72,
            interval_secs: 3600,
        }
    }
}

/// Deterministic score for one article at `now`. Rescoring with
/// unchanged counters moves the score only by the passage of time.
pub fn trending_score(
    cfg: &RankingConfig,
    views: u64,
    shares: u64,
    published_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let age_secs = (now - published_at).num_seconds().max(0) as f64;
    let age_hours = age_secs / 3600.0;
    let engagement =
        cfg.view_weight * views as f64 + cfg.share_weight * shares as f64 + cfg.baseline_weight;
    engagement * decay(age_hours, cfg.half_life_hours)
}

/// Exponential half-life decay, monotonically non-increasing in age.
fn decay(age_hours: f64, half_life_hours: f64) -> f64 {
    (-std::f64::consts::LN_2 * age_hours / half_life_hours).exp()
}

/// One rescore pass over the recent window. A failed write for one
/// article is logged and skipped; only a failed candidate load aborts
/// the pass.
pub async fn run_rescore(
    repo: &Arc<dyn ArticleRepository>,
    cfg: &RankingConfig,
    now: DateTime<Utc>,
) -> Result<usize, RepoError> {
    let cutoff = now - Duration::hours(cfg.rescore_window_hours);
    let candidates = repo.published_since(cutoff).await?;

    let mut updated = 0usize;
    for article in candidates {
        let score = trending_score(cfg, article.views, article.shares, article.published_at, now);
        match repo.set_trending_score(article.id, score).await {
            Ok(()) => updated += 1,
            Err(err) => {
                warn!(article_id = article.id, error = %err, "score update failed");
                counter!("rank_errors_total").increment(1);
            }
        }
    }

    counter!("rank_rescored_total").increment(updated as u64);
    Ok(updated)
}

pub struct RescoreHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl RescoreHandle {
    /// Request shutdown and wait for the job to finish.
    pub async fn stop(self) {
        let _ = self.cancel_tx.send(());
        if let Err(err) = self.join.await {
            warn!(error = %err, "rescore task failed to join");
        }
    }
}

/// Spawn the rescore job on its own cadence, decoupled from ingestion.
/// The task holds a sender clone, so a dropped handle leaves the job
/// running detached.
pub fn spawn_rescore_job(repo: Arc<dyn ArticleRepository>, cfg: RankingConfig) -> RescoreHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let keepalive = cancel_tx.clone();
    let join = tokio::spawn(async move {
        let _keepalive = keepalive;
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("rescore job shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let now = Utc::now();
                    match run_rescore(&repo, &cfg, now).await {
                        Ok(updated) => {
                            gauge!("rank_last_run_ts").set(now.timestamp() as f64);
                            info!(target: "rank", updated, "rescore tick");
                        }
                        Err(err) => warn!(error = %err, "rescore pass aborted"),
                    }
                }
            }
        }
    });

    RescoreHandle { cancel_tx, join }
}
