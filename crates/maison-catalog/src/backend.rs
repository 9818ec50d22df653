//! The search backend capability.

use async_trait::async_trait;

use maison_commerce::search::{ProductQuery, SearchOutcome};

use crate::error::CatalogError;

/// One backend able to answer a product query.
///
/// Each implementation owns its wire shapes (request DSL, response fields,
/// facet key names) and returns the unified [`SearchOutcome`]; nothing
/// backend-specific leaks past this trait. The cascade tries backends in a
/// fixed order and treats any error as "fall through to the next one".
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Answer a normalized query.
    async fn search(&self, query: &ProductQuery) -> Result<SearchOutcome, CatalogError>;
}
