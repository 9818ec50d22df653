//! HTTP client error types.

use thiserror::Error;

/// Errors that can occur when calling a catalog backend.
///
/// Every variant carries the endpoint it happened on; HTTP errors carry the
/// status and whether the retry policy may replay them.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-OK HTTP response.
    #[error("HTTP {status} on {endpoint}: {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
        retryable: bool,
    },

    /// The request did not complete within its deadline. Classified as a
    /// retryable timeout (HTTP 408 semantics).
    #[error("Timeout after {timeout_ms}ms on {endpoint}")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Connection-level failure (DNS, refused, reset).
    #[error("Connection error on {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The request could not even be constructed.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The HTTP status, where one applies. Timeouts report 408.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Timeout { .. } => Some(408),
            _ => None,
        }
    }

    /// The endpoint the error occurred on, where known.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ApiError::Http { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::Network { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => Some(endpoint),
            ApiError::InvalidUrl(_) => None,
        }
    }

    /// Whether the retry policy may replay this request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { retryable, .. } => *retryable,
            ApiError::Timeout { .. } | ApiError::Network { .. } => true,
            ApiError::Decode { .. } | ApiError::InvalidUrl(_) => false,
        }
    }

    /// 4xx response.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(s) if (400..500).contains(&s))
    }

    /// 5xx response.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code(), Some(s) if (500..600).contains(&s))
    }

    /// 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
