//! The catalog API client: reqwest with timeout, retry, and typed errors.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::retry::{is_retryable_status, RetryPolicy};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request options.
///
/// Array parameters expand to repeated keys: push the same name once per
/// value (or use [`params_all`](Self::params_all)).
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Override the client's timeout for this request.
    pub timeout: Option<Duration>,
    /// Override the client's retry budget for this request.
    pub retries: Option<u32>,
    /// Ask intermediaries not to serve a cached response.
    pub no_cache: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Add one repeated key per value.
    pub fn params_all(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl ToString>,
    ) -> Self {
        let name = name.into();
        for value in values {
            self.params.push((name.clone(), value.to_string()));
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }
}

/// Error body shape backends return on failure.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// HTTP client for catalog backends.
///
/// Wraps reqwest with a base URL, default headers, a per-request deadline
/// and an exponential-backoff retry policy limited to the retryable status
/// set. Exhausted or non-retryable failures propagate the last error to the
/// caller unchanged.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    default_headers: Vec<(String, String)>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            default_headers: Vec::new(),
            policy: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a header included on every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path);
        self.send_with_retry(&url, &options, || self.http.get(&url))
            .await
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path);
        let payload = serde_json::to_vec(body).map_err(|e| ApiError::Decode {
            endpoint: url.clone(),
            message: e.to_string(),
        })?;
        self.send_with_retry(&url, &options, || {
            self.http
                .post(&url)
                .header("Content-Type", "application/json")
                .body(payload.clone())
        })
        .await
    }

    pub(crate) fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<T, ApiError> {
        let timeout = options.timeout.unwrap_or(self.timeout);
        let policy = RetryPolicy {
            max_retries: options.retries.unwrap_or(self.policy.max_retries),
            ..self.policy.clone()
        };

        let mut attempt: u32 = 0;
        loop {
            match self.send_once(endpoint, options, timeout, &build).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !policy.should_retry(&error, attempt) {
                        return Err(error);
                    }
                    let delay = policy.delay_for_attempt(attempt);
                    debug!(
                        endpoint,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        timeout: Duration,
        build: &impl Fn() -> RequestBuilder,
    ) -> Result<T, ApiError> {
        let mut request = build().timeout(timeout);
        for (name, value) in &self.default_headers {
            request = request.header(name, value);
        }
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if options.no_cache {
            request = request.header("Cache-Control", "no-cache");
        }
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else if e.is_builder() {
                ApiError::InvalidUrl(endpoint.to_string())
            } else {
                ApiError::Network {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = extract_error_message(&body, status);
            warn!(endpoint, status, "request failed");
            return Err(ApiError::Http {
                status,
                endpoint: endpoint.to_string(),
                message,
                retryable: is_retryable_status(status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

/// Pull `error` or `message` out of a JSON error body, falling back to a
/// generic message.
fn extract_error_message(body: &[u8], status: u16) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}
