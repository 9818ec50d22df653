//! Resilient catalog fetching for the maison storefront.
//!
//! Two services live here, built on `maison-data`'s client and
//! `maison-cache`'s policies:
//!
//! - [`CascadingSearch`]: a fixed-order fallback chain over three
//!   [`SearchBackend`] adapters (search index, origin store API, bulk
//!   export). Each adapter owns its wire shapes and normalizes into the
//!   unified product/facet schema; the cascade caches outcomes for ~2
//!   minutes keyed by the full filter set and degrades to an empty result
//!   when every backend fails.
//! - [`CategoryService`]: the shared category cache with a single
//!   de-duplicated fetch, a staleness window with background revalidation,
//!   and snapshot fan-out to subscribers.
//!
//! # Example
//!
//! ```rust,ignore
//! use maison_catalog::{BulkExportBackend, CascadingSearch, IndexSearchBackend, StoreApiBackend};
//!
//! let cascade = CascadingSearch::new(vec![
//!     Box::new(IndexSearchBackend::new(index_client)),
//!     Box::new(StoreApiBackend::new(store_client)),
//!     Box::new(BulkExportBackend::new(store_client)),
//! ]);
//! let page = cascade.products_page(query).await;
//! ```

mod backend;
mod backends;
mod cascade;
mod categories;
mod error;

pub use backend::SearchBackend;
pub use backends::{BulkExportBackend, IndexSearchBackend, StoreApiBackend};
pub use cascade::CascadingSearch;
pub use categories::{
    CategoryService, CategorySnapshot, CategorySource, CategoryTreeEnvelope, HttpCategorySource,
    DEFAULT_STALENESS,
};
pub use error::CatalogError;
