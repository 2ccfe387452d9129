//! Single-shot fetch of `/_cluster/health`.

use std::future::Future;

use http::{StatusCode, Uri};
use thiserror::Error;
use tracing::debug;

use crate::client::{ClientError, ClusterClient};
use crate::health::ClusterHealth;

/// Path appended to the configured base URL.
pub const HEALTH_PATH: &str = "_cluster/health";

/// Why a fetch produced no snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection broke.
    #[error("failed to get cluster health from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: ClientError,
    },

    /// The cluster answered with something other than 200.
    #[error("HTTP request to {url} failed with code {status}")]
    UnexpectedStatus { url: String, status: StatusCode },

    /// The cluster answered 200 but the body could not be read to the end.
    #[error("failed to read cluster health body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ClientError,
    },

    /// The body was not a health document.
    #[error("failed to decode cluster health from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether the upstream answered 200 but its body did not yield a
    /// snapshot. These count as JSON parse failures.
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Body { .. } | FetchError::Decode { .. })
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::UnexpectedStatus { .. } => "status",
            FetchError::Body { .. } => "body",
            FetchError::Decode { .. } => "decode",
        }
    }
}

/// Anything that can produce a health snapshot on demand.
pub trait HealthSource: Send + Sync + 'static {
    /// Perform one fetch.
    fn fetch(&self) -> impl Future<Output = Result<ClusterHealth, FetchError>> + Send;
}

/// Fetches cluster health over HTTP.
#[derive(Clone, Debug)]
pub struct HealthFetcher {
    client: ClusterClient,
    url: Uri,
}

impl HealthFetcher {
    /// Create a fetcher for the cluster at `base_url`.
    ///
    /// The health path is joined onto the base URL's path once, here.
    pub fn new(client: ClusterClient, base_url: &str) -> Result<Self, ClientError> {
        let url = health_url(base_url)?;
        Ok(Self { client, url })
    }

    /// The full health endpoint URL.
    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// GET the health endpoint and decode the body.
    ///
    /// The response is owned by this call and dropped on every return
    /// path, which hands its connection back to the pool.
    pub async fn fetch(&self) -> Result<ClusterHealth, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .await
            .map_err(|source| self.transport(source))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus {
                url: self.url.to_string(),
                status,
            });
        }

        let body = self
            .client
            .read_body(resp)
            .await
            .map_err(|source| FetchError::Body {
                url: self.url.to_string(),
                source,
            })?;

        let health = ClusterHealth::from_slice(&body).map_err(|source| FetchError::Decode {
            url: self.url.to_string(),
            source,
        })?;

        debug!(
            url = %self.url,
            cluster = %health.cluster_name,
            status = %health.status,
            "cluster health fetched"
        );
        Ok(health)
    }

    fn transport(&self, source: ClientError) -> FetchError {
        FetchError::Transport {
            url: self.url.to_string(),
            source,
        }
    }
}

impl HealthSource for HealthFetcher {
    fn fetch(&self) -> impl Future<Output = Result<ClusterHealth, FetchError>> + Send {
        HealthFetcher::fetch(self)
    }
}

/// Join [`HEALTH_PATH`] onto the path of `base`, keeping any query string.
///
/// Empty path segments are dropped, so `http://h:9200`, `http://h:9200/`
/// and `http://h:9200//` all resolve to `/_cluster/health`.
pub fn health_url(base: &str) -> Result<Uri, ClientError> {
    let invalid = |reason: &str| ClientError::InvalidUrl {
        url: base.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = base.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

    match uri.scheme_str() {
        Some("http") => {}
        Some("https") => return Err(invalid("https is not supported, use http")),
        Some(other) => return Err(invalid(&format!("unsupported scheme {other}"))),
        None => return Err(invalid("missing scheme")),
    }
    let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;

    let segments: Vec<&str> = uri
        .path()
        .split('/')
        .chain(HEALTH_PATH.split('/'))
        .filter(|s| !s.is_empty())
        .collect();

    let mut path_and_query = format!("/{}", segments.join("/"));
    if let Some(query) = uri.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    Uri::builder()
        .scheme("http")
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| invalid(&e.to_string()))
}
