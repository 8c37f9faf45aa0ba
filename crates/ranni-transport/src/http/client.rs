//! HTTP client for the gateway API.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use ranni_core::{TransportError, TransportResult};

use crate::query::with_access_token;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client for calls against the gateway's HTTP API.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpClient {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> TransportResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TransportError::InvalidConfig(format!("invalid callback address {base_url:?}: {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TransportError::InvalidConfig(format!(
                "callback address must use http or https, got {}",
                base_url.scheme()
            )));
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    /// Builds the full URL for `path` with `params` and the access token.
    pub fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(None);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        with_access_token(url, self.access_token.as_deref())
    }

    /// Sends `body` as JSON to `path` and returns the decoded response.
    pub async fn post_json(&self, path: &str, body: &Value) -> TransportResult<Value> {
        let url = self.endpoint(path, &[]);
        trace!(path, "POST gateway API");
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;
        read_json(path, resp).await
    }

    /// Sends a GET to `path` with query `params` and returns the decoded response.
    pub async fn get_json(&self, path: &str, params: &[(&str, String)]) -> TransportResult<Value> {
        let url = self.endpoint(path, params);
        trace!(path, "GET gateway API");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;
        read_json(path, resp).await
    }
}

async fn read_json(path: &str, resp: Response) -> TransportResult<Value> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        debug!(path, status = status.as_u16(), "Gateway API returned error status");
        return Err(TransportError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await.map_err(map_request_error)?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| TransportError::Io(format!("invalid JSON response from {path}: {e}")))
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Io(e.to_string())
    }
}
