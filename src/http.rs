//! HTTP transport shared by every source adapter.
//!
//! Adapters are generic over [`HttpClient`] so tests can swap in a canned
//! client without touching the network.

use std::future::Future;
use std::time::Duration;

use log::{debug, trace, warn};
use thiserror::Error;

/// Browser User-Agent; the routing service rejects requests without one.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("request timed out: {0}")]
    Timeout(String),
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;

    /// GET with extra headers, given as `(name, value)` pairs.
    fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;

    /// POST an `application/x-www-form-urlencoded` body, optionally with
    /// HTTP Basic credentials `(user, password)`.
    fn post_form(
        &self,
        url: &str,
        basic_auth: Option<(&str, &str)>,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| HttpError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn finish(
        url: &str,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Vec<u8>, HttpError> {
        let response = sent.map_err(|e| classify(url, e))?;
        let status = response.status();
        debug!("HTTP {} from {}", status.as_u16(), url);

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| classify(url, e))?;
        trace!("read {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

fn classify(url: &str, err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        warn!("HTTP request to {url} timed out");
        HttpError::Timeout(url.to_string())
    } else {
        warn!(
            "HTTP request to {url} failed (connect={}, request={}): {err}",
            err.is_connect(),
            err.is_request()
        );
        HttpError::Request(err.to_string())
    }
}

impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        trace!("GET {url}");
        let sent = self.client.get(url).send().await;
        Self::finish(url, sent).await
    }

    async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, HttpError> {
        trace!("GET {url} ({} extra headers)", headers.len());
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let sent = request.send().await;
        Self::finish(url, sent).await
    }

    async fn post_form(
        &self,
        url: &str,
        basic_auth: Option<(&str, &str)>,
        form: &[(&str, &str)],
    ) -> Result<Vec<u8>, HttpError> {
        trace!("POST {url}");
        let mut request = self.client.post(url).form(form);
        if let Some((user, password)) = basic_auth {
            request = request.basic_auth(user, Some(password));
        }
        let sent = request.send().await;
        Self::finish(url, sent).await
    }
}
