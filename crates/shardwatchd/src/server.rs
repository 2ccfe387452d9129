//! Exporter lifecycle: build the shared client and counters, serve scrapes,
//! stop on Ctrl-C.

use anyhow::Context;
use tracing::info;

use shardwatch_api::{ExporterState, build_router};
use shardwatch_health::{ClusterClient, HealthFetcher};
use shardwatch_metrics::ScrapeCounters;

use crate::config::ExporterConfig;

/// Run the exporter until a shutdown signal arrives.
pub async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!("shardwatch exporter starting");

    // ── Outbound client ────────────────────────────────────────

    let timeout = config.timeout()?;
    let client = ClusterClient::new(timeout);
    let fetcher = HealthFetcher::new(client, &config.cluster.uri)
        .with_context(|| format!("cluster uri {:?}", config.cluster.uri))?;
    info!(url = %fetcher.url(), timeout_ms = timeout.as_millis() as u64, "cluster health client initialized");

    // ── Process-wide counters ──────────────────────────────────

    let counters = ScrapeCounters::new(&config.metrics.namespace)?;
    info!(namespace = %config.metrics.namespace, "scrape counters initialized");

    // ── HTTP server ────────────────────────────────────────────

    let state = ExporterState::new(
        fetcher,
        counters,
        &config.metrics.namespace,
        &config.web.telemetry_path,
    );
    let router = build_router(state);
    let addr = config.listen_address()?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, path = %config.web.telemetry_path, "listening for scrapes");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("shardwatch exporter stopped");
    Ok(())
}
