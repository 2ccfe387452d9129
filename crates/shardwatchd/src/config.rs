//! shardwatch.toml configuration, with command-line overrides.
//!
//! Precedence: flags > file > built-in defaults.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub web: WebConfig,
    pub metrics: MetricsConfig,
    pub cluster: ClusterConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub listen_address: String,
    pub telemetry_path: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9114".to_string(),
            telemetry_path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prefix of every exported metric name.
    pub namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "elasticsearch".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Base URL of the cluster; `/_cluster/health` is appended.
    pub uri: String,
    /// Request timeout, e.g. "5s", "500ms", "1m".
    pub timeout: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:9200".to_string(),
            timeout: "5s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Flags that override file values when given.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Address to listen on for scrapes.
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long)]
    pub telemetry_path: Option<String>,

    /// Metric name prefix.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Base URL of the cluster.
    #[arg(long)]
    pub es_uri: Option<String>,

    /// Timeout for the health request.
    #[arg(long)]
    pub es_timeout: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path` if given, else defaults, then apply `overrides`
    /// and validate.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.listen_address {
            self.web.listen_address = v;
        }
        if let Some(v) = overrides.telemetry_path {
            self.web.telemetry_path = v;
        }
        if let Some(v) = overrides.namespace {
            self.metrics.namespace = v;
        }
        if let Some(v) = overrides.es_uri {
            self.cluster.uri = v;
        }
        if let Some(v) = overrides.es_timeout {
            self.cluster.timeout = v;
        }
        if let Some(v) = overrides.log_format {
            self.log.format = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.listen_address()?;
        self.timeout()?;

        let path = &self.web.telemetry_path;
        if !path.starts_with('/') || path == "/" {
            bail!("telemetry path must start with '/' and not be the root, got {path:?}");
        }

        let ns = &self.metrics.namespace;
        if !is_metric_name(ns) {
            bail!("namespace {ns:?} is not a valid metric name prefix");
        }
        Ok(())
    }

    pub fn listen_address(&self) -> anyhow::Result<SocketAddr> {
        self.web
            .listen_address
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.web.listen_address))
    }

    pub fn timeout(&self) -> anyhow::Result<Duration> {
        match parse_duration(&self.cluster.timeout) {
            Some(d) if !d.is_zero() => Ok(d),
            Some(_) => bail!("cluster timeout must be greater than zero"),
            None => bail!("invalid cluster timeout {:?}", self.cluster.timeout),
        }
    }
}

fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
