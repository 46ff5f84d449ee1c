// src/ingest/mod.rs
pub mod feed;
pub mod fetch;
pub mod normalize;
pub mod scheduler;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::dedup;
use crate::error::{IngestError, RepoError};
use crate::model::Source;
use crate::rank::{self, RankingConfig};
use crate::repo::{ArticleRepository, UpsertOutcome};
use fetch::FeedClient;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_cycles_total", "Completed poll cycles.");
        describe_counter!("ingest_entries_total", "Entries parsed from feeds.");
        describe_counter!("ingest_inserted_total", "New articles stored.");
        describe_counter!(
            "ingest_duplicates_total",
            "Entries dropped as duplicate fingerprints."
        );
        describe_counter!("ingest_invalid_total", "Entries rejected by the normalizer.");
        describe_counter!("ingest_source_errors_total", "Feed fetch/parse failures.");
        describe_histogram!(
            "ingest_source_ms",
            "Per-source fetch+ingest time in milliseconds."
        );
        describe_gauge!(
            "ingest_last_cycle_ts",
            "Unix ts when the last poll cycle finished."
        );
    });
}

/// Normalize text: decode HTML entities, drop tags, fold typographic
/// quotes to ASCII, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Per-cycle tallies, returned for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub sources_polled: usize,
    pub sources_failed: usize,
    pub entries: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

enum SourceFailure {
    /// Fetch or parse failure; the source is skipped for this cycle.
    Ingest(IngestError),
    /// Storage is unreachable; the whole cycle aborts and retries next
    /// cadence.
    Storage(RepoError),
}

/// Poll every given source once, bounded by `max_in_flight`. Each
/// source and each entry fails independently; only storage
/// unavailability aborts the cycle.
pub async fn run_cycle(
    sources: &[Source],
    client: &Arc<dyn FeedClient>,
    repo: &Arc<dyn ArticleRepository>,
    ingest_cfg: &IngestConfig,
    ranking_cfg: &RankingConfig,
) -> Result<CycleStats, RepoError> {
    ensure_metrics_described();

    // Build each per-source future eagerly into an owned Vec so the
    // stream holds no borrow of `sources` across the await points.
    let tasks: Vec<_> = sources
        .iter()
        .enumerate()
        .map(|(idx, source)| {
            timed_ingest_source(
                idx,
                source.clone(),
                Arc::clone(client),
                Arc::clone(repo),
                *ingest_cfg,
                *ranking_cfg,
            )
        })
        .collect();
    let per_source: Vec<(usize, Result<CycleStats, SourceFailure>)> = stream::iter(tasks)
        .buffer_unordered(ingest_cfg.max_in_flight.max(1))
        .collect()
        .await;

    let mut stats = CycleStats::default();
    let mut storage_down: Option<RepoError> = None;
    for (idx, outcome) in per_source {
        let source = &sources[idx];
        stats.sources_polled += 1;
        match outcome {
            Ok(s) => {
                stats.entries += s.entries;
                stats.inserted += s.inserted;
                stats.duplicates += s.duplicates;
                stats.invalid += s.invalid;
            }
            Err(SourceFailure::Ingest(err)) => {
                stats.sources_failed += 1;
                counter!("ingest_source_errors_total").increment(1);
                warn!(source = %source.name, error = %err, "source skipped this cycle");
            }
            Err(SourceFailure::Storage(err)) => {
                stats.sources_failed += 1;
                storage_down = Some(err);
            }
        }
    }

    counter!("ingest_entries_total").increment(stats.entries as u64);
    counter!("ingest_inserted_total").increment(stats.inserted as u64);
    counter!("ingest_duplicates_total").increment(stats.duplicates as u64);
    counter!("ingest_invalid_total").increment(stats.invalid as u64);
    gauge!("ingest_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);

    match storage_down {
        Some(err) => Err(err),
        None => Ok(stats),
    }
}

async fn timed_ingest_source(
    idx: usize,
    source: Source,
    client: Arc<dyn FeedClient>,
    repo: Arc<dyn ArticleRepository>,
    ingest_cfg: IngestConfig,
    ranking_cfg: RankingConfig,
) -> (usize, Result<CycleStats, SourceFailure>) {
    let t0 = std::time::Instant::now();
    let outcome = ingest_source(&source, &client, &repo, &ingest_cfg, &ranking_cfg).await;
    histogram!("ingest_source_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    (idx, outcome)
}

async fn ingest_source(
    source: &Source,
    client: &Arc<dyn FeedClient>,
    repo: &Arc<dyn ArticleRepository>,
    ingest_cfg: &IngestConfig,
    ranking_cfg: &RankingConfig,
) -> Result<CycleStats, SourceFailure> {
    let body = fetch::fetch_with_retry(client, source, ingest_cfg)
        .await
        .map_err(SourceFailure::Ingest)?;
    let items = feed::parse_feed(&body).map_err(SourceFailure::Ingest)?;

    let mut stats = CycleStats::default();
    for item in items.into_iter().take(ingest_cfg.max_entries_per_feed) {
        stats.entries += 1;

        let draft = match normalize::build_draft(item, source) {
            Ok(d) => d,
            Err(err) => {
                stats.invalid += 1;
                debug!(source = %source.name, error = %err, "entry skipped");
                continue;
            }
        };

        let fp = dedup::fingerprint(&draft.title);
        // Advisory pre-filter; the upsert below stays authoritative
        // when two cycles race on the same headline.
        match dedup::is_duplicate(repo, &fp).await {
            Ok(true) => {
                stats.duplicates += 1;
                continue;
            }
            Ok(false) => {}
            Err(err) => return Err(SourceFailure::Storage(err)),
        }

        let initial =
            rank::trending_score(ranking_cfg, 0, 0, draft.published_at, chrono::Utc::now());
        match repo.upsert(draft, &fp, initial).await {
            Ok(UpsertOutcome::Inserted(id)) => {
                stats.inserted += 1;
                debug!(source = %source.name, article_id = id, "article stored");
            }
            Ok(UpsertOutcome::AlreadyExists(_)) => {
                stats.duplicates += 1;
            }
            Err(err @ RepoError::Unavailable(_)) => return Err(SourceFailure::Storage(err)),
            Err(err) => {
                stats.invalid += 1;
                warn!(source = %source.name, error = %err, "upsert failed for entry");
            }
        }
    }

    info!(
        target: "ingest",
        source = %source.name,
        entries = stats.entries,
        inserted = stats.inserted,
        duplicates = stats.duplicates,
        "source ingested"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "<p>Hello&nbsp;<b>world</b> &ldquo;ok&rdquo;</p>";
        assert_eq!(normalize_text(s), r#"Hello world "ok""#);
    }

    #[test]
    fn normalize_folds_whitespace() {
        assert_eq!(normalize_text("A\u{00A0}\n\tB   C"), "A B C");
    }

    #[test]
    fn normalize_keeps_plain_text_intact() {
        assert_eq!(
            normalize_text("Parliament passes new budget!"),
            "Parliament passes new budget!"
        );
    }
}
