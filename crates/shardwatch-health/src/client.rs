//! Outbound HTTP client shared by every scrape.
//!
//! A single pooled hyper client is built at startup and cloned into each
//! fetch. The timeout is owned here, not by the fetcher.

use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, Uri};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

const USER_AGENT: &str = concat!("shardwatch/", env!("CARGO_PKG_VERSION"));

/// Errors raised while talking to the cluster.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid cluster url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build request: {0}")]
    Build(#[from] http::Error),

    #[error("request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Pooled HTTP/1 client with a per-request timeout.
///
/// Cloning is cheap and clones share the connection pool, so one client
/// serves any number of concurrent scrapes.
#[derive(Clone, Debug)]
pub struct ClusterClient {
    inner: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl ClusterClient {
    /// Create a client whose requests and body reads each give up after
    /// `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let inner = Client::builder(TokioExecutor::new()).build_http();
        Self { inner, timeout }
    }

    /// Send a GET and wait for the response head.
    pub async fn get(&self, uri: &Uri) -> Result<Response<Incoming>, ClientError> {
        let req = Request::builder()
            .method("GET")
            .uri(uri.clone())
            .header("user-agent", USER_AGENT)
            .header("accept", "application/json")
            .body(Empty::<Bytes>::new())?;

        match tokio::time::timeout(self.timeout, self.inner.request(req)).await {
            Ok(resp) => Ok(resp?),
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }

    /// Read a response body to the end, consuming the response.
    pub async fn read_body(&self, resp: Response<Incoming>) -> Result<Bytes, ClientError> {
        match tokio::time::timeout(self.timeout, resp.into_body().collect()).await {
            Ok(collected) => Ok(collected?.to_bytes()),
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }
}
