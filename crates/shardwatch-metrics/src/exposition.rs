//! Prometheus text exposition for one scrape.
//!
//! Each scrape gets a brand-new registry holding exactly one collector, so
//! nothing registered by one request is visible to another.

use prometheus::{Encoder, Registry, TextEncoder};
use thiserror::Error;

use shardwatch_health::HealthSource;

use crate::collector::HealthCollector;

/// Content type of the rendered body.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Failures inside the registry or encoder. Upstream fetch failures are
/// not errors here; they show up as `up 0` in the body.
#[derive(Debug, Error)]
pub enum ExpositionError {
    #[error("failed to register collector: {0}")]
    Register(#[source] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    #[error("encoded metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Register `collector` into a fresh registry, gather, and encode.
///
/// Blocks while the collector fetches; run it off the async workers.
pub fn render_scrape<S: HealthSource>(
    collector: HealthCollector<S>,
) -> Result<String, ExpositionError> {
    let registry = Registry::new();
    registry
        .register(Box::new(collector))
        .map_err(ExpositionError::Register)?;

    let families = registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buffer)
        .map_err(ExpositionError::Encode)?;

    Ok(String::from_utf8(buffer)?)
}
