//! Cascading search: fixed-order fallback across backends with short-TTL
//! output caching.
//!
//! Search must degrade, never crash the page: a backend error means "try
//! the next one", and total exhaustion yields an empty-but-valid outcome.

use std::sync::Arc;
use std::time::Duration;

use maison_cache::{CacheKey, CachePolicy, Lookup, TtlCache};
use maison_commerce::search::{ProductQuery, ProductsPage, SearchOutcome};
use tracing::{debug, warn};

use crate::backend::SearchBackend;

/// Output cache freshness window.
const SEARCH_CACHE_TTL: Duration = Duration::from_secs(120);
/// How long a stale entry may still be served while revalidating.
const SEARCH_CACHE_SWR: Duration = Duration::from_secs(120);

/// The fallback chain over the configured backends.
pub struct CascadingSearch {
    backends: Arc<Vec<Box<dyn SearchBackend>>>,
    cache: Arc<TtlCache<SearchOutcome>>,
}

impl CascadingSearch {
    /// Build a cascade over backends in fallback order (primary first).
    pub fn new(backends: Vec<Box<dyn SearchBackend>>) -> Self {
        let policy = CachePolicy::ttl(SEARCH_CACHE_TTL).with_swr(SEARCH_CACHE_SWR);
        Self::with_policy(backends, policy)
    }

    pub fn with_policy(backends: Vec<Box<dyn SearchBackend>>, policy: CachePolicy) -> Self {
        Self {
            backends: Arc::new(backends),
            cache: Arc::new(TtlCache::new(policy)),
        }
    }

    /// Answer a query, consulting the output cache first.
    ///
    /// Cached entries are keyed by the full normalized filter set. A stale
    /// entry is served immediately while one background revalidation runs.
    pub async fn search(&self, query: ProductQuery) -> SearchOutcome {
        let query = query.normalized();
        let key = CacheKey::from_parts("search", query.cache_parts());

        match self.cache.get(key.as_str()) {
            Lookup::Fresh(outcome) => outcome,
            Lookup::Stale(outcome) => {
                debug!(key = %key, "serving stale search result, revalidating");
                let backends = Arc::clone(&self.backends);
                let cache = Arc::clone(&self.cache);
                let key = key.as_str().to_string();
                tokio::spawn(async move {
                    run_chain(&backends, &cache, &query, &key).await;
                });
                outcome
            }
            Lookup::Miss => run_chain(&self.backends, &self.cache, &query, key.as_str()).await,
        }
    }

    /// The `GET /api/catalog/products` envelope.
    pub async fn products_page(&self, query: ProductQuery) -> ProductsPage {
        let query = query.normalized();
        let limit = query.limit;
        let offset = query.offset;
        let outcome = self.search(query).await;
        ProductsPage::from_outcome(outcome, limit, offset)
    }
}

/// Try each backend in order; cache and return the first success. The
/// degraded empty outcome is not cached, so recovery is picked up on the
/// next request.
async fn run_chain(
    backends: &[Box<dyn SearchBackend>],
    cache: &TtlCache<SearchOutcome>,
    query: &ProductQuery,
    key: &str,
) -> SearchOutcome {
    for backend in backends {
        match backend.search(query).await {
            Ok(outcome) => {
                cache.insert(key, outcome.clone());
                return outcome;
            }
            Err(error) => {
                warn!(
                    backend = backend.name(),
                    error = %error,
                    "search backend failed, falling back"
                );
            }
        }
    }

    warn!("all search backends failed, returning empty result set");
    SearchOutcome::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maison_commerce::catalog::{Product, ProductPrice};
    use maison_commerce::money::{Currency, Money};
    use maison_commerce::search::SearchFacets;
    use maison_commerce::ProductId;
    use maison_data::ApiError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use crate::error::CatalogError;

    fn outcome_with(ids: &[&str]) -> SearchOutcome {
        SearchOutcome {
            products: ids
                .iter()
                .map(|id| Product {
                    id: ProductId::new(*id),
                    title: id.to_string(),
                    handle: id.to_string(),
                    subtitle: None,
                    description: None,
                    thumbnail: None,
                    images: Vec::new(),
                    price: ProductPrice::from_money(Money::new(1000, Currency::EUR)),
                    in_stock: true,
                    total_inventory: 1,
                    categories: Vec::new(),
                    brand: None,
                    tags: Vec::new(),
                    created_at: 0,
                })
                .collect(),
            total: ids.len() as i64,
            facets: SearchFacets::default_facets(),
        }
    }

    struct FixedBackend {
        name: &'static str,
        result: Result<Vec<&'static str>, ()>,
        calls: Arc<AtomicU32>,
    }

    impl FixedBackend {
        fn ok(name: &'static str, ids: Vec<&'static str>) -> Self {
            Self {
                name,
                result: Ok(ids),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                result: Err(()),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for FixedBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &ProductQuery) -> Result<SearchOutcome, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(ids) => Ok(outcome_with(ids)),
                Err(()) => Err(CatalogError::Api(ApiError::Timeout {
                    endpoint: "/test".to_string(),
                    timeout_ms: 10,
                })),
            }
        }
    }

    #[tokio::test]
    async fn test_primary_success_stops_chain() {
        let cascade = CascadingSearch::new(vec![
            Box::new(FixedBackend::ok("a", vec!["p1"])),
            Box::new(FixedBackend::ok("b", vec!["p2"])),
        ]);

        let outcome = cascade.search(ProductQuery::new()).await;
        assert_eq!(outcome.products[0].id.as_str(), "p1");
    }

    #[tokio::test]
    async fn test_fallback_to_secondary() {
        let cascade = CascadingSearch::new(vec![
            Box::new(FixedBackend::failing("a")),
            Box::new(FixedBackend::ok("b", vec!["p2", "p3"])),
        ]);

        let outcome = cascade.search(ProductQuery::new()).await;
        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.products[0].id.as_str(), "p2");
    }

    #[tokio::test]
    async fn test_fallback_to_tertiary() {
        let cascade = CascadingSearch::new(vec![
            Box::new(FixedBackend::failing("a")),
            Box::new(FixedBackend::failing("b")),
            Box::new(FixedBackend::ok("c", vec!["p9"])),
        ]);

        let outcome = cascade.search(ProductQuery::new()).await;
        assert_eq!(outcome.products[0].id.as_str(), "p9");
    }

    #[tokio::test]
    async fn test_total_exhaustion_returns_empty() {
        let cascade = CascadingSearch::new(vec![
            Box::new(FixedBackend::failing("a")),
            Box::new(FixedBackend::failing("b")),
            Box::new(FixedBackend::failing("c")),
        ]);

        let outcome = cascade.search(ProductQuery::new()).await;
        assert!(outcome.products.is_empty());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.facets.price_ranges.len(), 6);
    }

    #[tokio::test]
    async fn test_results_cached_by_filter_set() {
        let backend = FixedBackend::ok("a", vec!["p1"]);
        let counter = Arc::clone(&backend.calls);
        let cascade = CascadingSearch::new(vec![Box::new(backend)]);

        let q = ProductQuery::new().with_category("bagues");
        cascade.search(q.clone()).await;
        cascade.search(q.clone()).await;
        // Second call served from cache.
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // A different filter set misses the cache.
        cascade.search(q.with_brand("Chaumet")).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_products_page_echoes_pagination() {
        let cascade =
            CascadingSearch::new(vec![Box::new(FixedBackend::ok("a", vec!["p1"]))]);
        let page = cascade
            .products_page(ProductQuery::new().with_pagination(500, -5))
            .await;
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 0);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let cascade = CascadingSearch::new(vec![Box::new(FixedBackend::failing("a"))]);
        let q = ProductQuery::new();
        assert_eq!(cascade.search(q.clone()).await.total, 0);
        // Still retried on the next call rather than served from cache.
        assert_eq!(cascade.search(q).await.total, 0);
    }
}
