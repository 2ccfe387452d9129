//! shardwatch-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | any | `<telemetry path>` (default `/metrics`) | Scrape the cluster and expose Prometheus text |
//! | GET | `/` | Index page linking to the telemetry path |
//!
//! Every scrape builds its own collector and registry. Only the outbound
//! client and the bookkeeping counters are shared between requests.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use shardwatch_health::HealthFetcher;
use shardwatch_metrics::ScrapeCounters;

/// Shared state for the scrape handlers.
#[derive(Clone)]
pub struct ExporterState {
    pub fetcher: Arc<HealthFetcher>,
    pub counters: ScrapeCounters,
    /// Metric name prefix.
    pub namespace: Arc<str>,
    pub telemetry_path: Arc<str>,
}

impl ExporterState {
    pub fn new(
        fetcher: HealthFetcher,
        counters: ScrapeCounters,
        namespace: &str,
        telemetry_path: &str,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            counters,
            namespace: Arc::from(namespace),
            telemetry_path: Arc::from(telemetry_path),
        }
    }
}

/// Build the exporter router.
pub fn build_router(state: ExporterState) -> Router {
    let telemetry_path = state.telemetry_path.to_string();

    Router::new()
        .route("/", get(handlers::index))
        .route(&telemetry_path, any(handlers::scrape))
        .with_state(state)
}
