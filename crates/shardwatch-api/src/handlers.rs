//! Scrape and index handlers.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::error;

use shardwatch_metrics::{CONTENT_TYPE, ExpositionError, HealthCollector, render_scrape};

use crate::ExporterState;

/// Failures of the exporter itself. An unreachable cluster is not one of
/// these; it renders as `up 0`.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to build collector: {0}")]
    Collector(#[source] prometheus::Error),

    #[error(transparent)]
    Exposition(#[from] ExpositionError),

    #[error("scrape task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        error!(error = %self, "scrape failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// `<telemetry path>` — scrape the cluster once and render the result.
pub async fn scrape(State(state): State<ExporterState>) -> Result<Response, ScrapeError> {
    let collector = HealthCollector::new(
        state.fetcher.clone(),
        state.counters.clone(),
        &state.namespace,
        Handle::current(),
    )
    .map_err(ScrapeError::Collector)?;

    // The registry pulls synchronously and the collector blocks on the
    // fetch, so keep it off the async workers.
    let body = tokio::task::spawn_blocking(move || render_scrape(collector)).await??;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response())
}

/// GET /
pub async fn index(State(state): State<ExporterState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>shardwatch</title></head>\n\
         <body>\n\
         <h1>shardwatch</h1>\n\
         <p>Cluster health: <code>{url}</code></p>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        url = state.fetcher.url(),
        path = state.telemetry_path,
    ))
}
