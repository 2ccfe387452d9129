//! shardwatch-health — cluster health fetching for shardwatch.
//!
//! Issues a single `GET /_cluster/health` against the configured cluster
//! and decodes the JSON body into a [`ClusterHealth`] snapshot. Nothing is
//! cached or retried; every call is one round-trip.
//!
//! # Architecture
//!
//! ```text
//! HealthFetcher (implements HealthSource)
//!   ├── ClusterClient (pooled hyper client + timeout, shared)
//!   ├── fetch() → ClusterHealth
//!   └── FetchError: Transport | UnexpectedStatus | Decode
//! ```
//!
//! The fetcher only reports *what* went wrong. Counting failures is the
//! caller's job (see `shardwatch-metrics`).

pub mod client;
pub mod fetcher;
pub mod health;

pub use client::{ClientError, ClusterClient};
pub use fetcher::{FetchError, HealthFetcher, HealthSource};
pub use health::{ClusterHealth, STATUS_COLORS};
