//! HTTP client utilities for the maison storefront.
//!
//! Provides the request plumbing every catalog backend shares: base URL
//! joining, repeated-key query parameters, a per-request deadline, an
//! exponential-backoff retry policy restricted to a known-retryable status
//! set, and a typed error carrying status, endpoint and retryability.
//!
//! # Example
//!
//! ```rust,ignore
//! use maison_data::{ApiClient, RequestOptions};
//!
//! let client = ApiClient::new("https://api.maison.example");
//! let page: ProductsPage = client
//!     .get(
//!         "/api/catalog/products",
//!         RequestOptions::new().param("limit", 20).param("sort", "newest"),
//!     )
//!     .await?;
//! ```

mod client;
mod error;
mod retry;

pub use client::{ApiClient, RequestOptions, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use retry::{is_retryable_status, RetryPolicy, RETRYABLE_STATUSES};
