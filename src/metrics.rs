use axum::{routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus recorder plus the `/metrics` route. Counters are emitted
/// where the work happens (ingest, rank); this only owns the exporter
/// and the static cadence gauges.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the recorder and publish both job cadences, so dashboards
    /// can tell a stalled job from a slow one.
    pub fn init(poll_interval_secs: u64, rescore_interval_secs: u64) -> Self {
        // Default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_gauge!("ingest_poll_interval_secs", "Configured poll cadence.");
        describe_gauge!("rank_interval_secs", "Configured rescore cadence.");
        gauge!("ingest_poll_interval_secs").set(poll_interval_secs as f64);
        gauge!("rank_interval_secs").set(rescore_interval_secs as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
