//! Catalog layer error types.

use thiserror::Error;

/// Errors from the catalog fetching layer.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Transport failure from the API client.
    #[error(transparent)]
    Api(#[from] maison_data::ApiError),

    /// A backend answered with a shape we could not interpret.
    #[error("Schema error from backend {backend}: {message}")]
    Schema {
        backend: &'static str,
        message: String,
    },

    /// The category fetch failed on first load.
    #[error("Category fetch failed: {0}")]
    CategoryFetch(String),

    /// The service was disposed and no longer serves reads.
    #[error("Category service disposed")]
    Disposed,
}
