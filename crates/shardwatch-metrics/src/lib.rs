//! shardwatch-metrics — turns cluster health into Prometheus samples.
//!
//! A [`HealthCollector`] is registered into a registry for the duration of
//! one scrape. When the registry gathers, the collector fetches a fresh
//! snapshot and maps it through a static metric table.
//!
//! # Architecture
//!
//! ```text
//! HealthCollector (prometheus::core::Collector)
//!   ├── desc()    → field table + status + 3 counters
//!   ├── collect() → HealthSource::fetch() → samples
//!   └── ScrapeCounters (process-wide, shared via Arc)
//!
//! Exposition
//!   └── render_scrape() → fresh Registry → text/plain for /metrics
//! ```
//!
//! Every name has the shape `<namespace>_cluster_health_<field>`.

pub mod collector;
pub mod counters;
pub mod definitions;
pub mod exposition;

pub use collector::{HealthCollector, ScrapeOutcome};
pub use counters::ScrapeCounters;
pub use definitions::{FIELD_METRICS, FieldMetric, STATUS_METRIC, SUBSYSTEM, StatusMetric};
pub use exposition::{CONTENT_TYPE, ExpositionError, render_scrape};
