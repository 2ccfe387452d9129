//! shardwatchd — the shardwatch daemon.
//!
//! Serves the health of one search cluster as Prometheus metrics. Every
//! scrape of the telemetry path triggers exactly one
//! `GET /_cluster/health` against the cluster.
//!
//! # Usage
//!
//! ```text
//! shardwatchd --es-uri http://localhost:9200 --listen-address 0.0.0.0:9114
//! shardwatchd --config /etc/shardwatch/shardwatch.toml
//! ```

mod config;
mod server;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ExporterConfig, LogFormat, Overrides};

#[derive(Parser)]
#[command(name = "shardwatchd", about = "Cluster health exporter for Prometheus", version)]
struct Cli {
    /// Path to a shardwatch.toml file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ExporterConfig::load(cli.config.as_deref(), cli.overrides)?;

    init_tracing(config.log.format);

    server::run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,shardwatchd=debug,shardwatch=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}
