//! Cross-service flows: cascading search and the category cache together.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use maison_catalog::{
    CascadingSearch, CatalogError, CategoryService, CategorySource, SearchBackend,
};
use maison_commerce::catalog::{CategoryResponse, Product, ProductPrice, RawCategory};
use maison_commerce::money::{Currency, Money};
use maison_commerce::search::{ProductQuery, SearchFacets, SearchOutcome, SortOption};
use maison_commerce::{CategoryId, ProductId};
use maison_data::ApiError;

fn product(id: &str, title: &str, cents: i64, categories: &[&str]) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        handle: id.to_string(),
        subtitle: None,
        description: None,
        thumbnail: None,
        images: Vec::new(),
        price: ProductPrice::from_money(Money::new(cents, Currency::EUR)),
        in_stock: true,
        total_inventory: 2,
        categories: categories.iter().map(|s| s.to_string()).collect(),
        brand: Some("Chaumet".to_string()),
        tags: Vec::new(),
        created_at: 0,
    }
}

/// A backend that fails like a timed-out index.
struct TimingOutBackend;

#[async_trait]
impl SearchBackend for TimingOutBackend {
    fn name(&self) -> &'static str {
        "search-index"
    }

    async fn search(&self, _query: &ProductQuery) -> Result<SearchOutcome, CatalogError> {
        Err(CatalogError::Api(ApiError::Timeout {
            endpoint: "/indexes/products/search".to_string(),
            timeout_ms: 10_000,
        }))
    }
}

/// A healthy secondary backend serving two hits.
struct HealthySecondary {
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl SearchBackend for HealthySecondary {
    fn name(&self) -> &'static str {
        "store-api"
    }

    async fn search(&self, query: &ProductQuery) -> Result<SearchOutcome, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut products = vec![
            product("p1", "Bague solitaire", 250_000, &["bijoux", "bagues"]),
            product("p2", "Bague jonc", 90_000, &["bijoux", "bagues"]),
        ];
        if query.sort == SortOption::PriceAsc {
            products.sort_by_key(|p| p.price.amount);
        }
        Ok(SearchOutcome {
            total: products.len() as i64,
            facets: SearchFacets::default_facets(),
            products,
        })
    }
}

#[tokio::test]
async fn primary_timeout_falls_back_to_secondary_hits() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("maison_catalog=warn")
        .with_test_writer()
        .try_init();

    let calls = Arc::new(AtomicU32::new(0));
    let cascade = CascadingSearch::new(vec![
        Box::new(TimingOutBackend),
        Box::new(HealthySecondary {
            calls: Arc::clone(&calls),
        }),
    ]);

    let outcome = cascade
        .search(ProductQuery::new().with_category("bagues"))
        .await;

    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.products.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn page_envelope_carries_clamped_pagination() {
    let cascade = CascadingSearch::new(vec![Box::new(HealthySecondary {
        calls: Arc::new(AtomicU32::new(0)),
    })]);

    let page = cascade
        .products_page(
            ProductQuery::new()
                .with_sort(SortOption::PriceAsc)
                .with_pagination(999, -1),
        )
        .await;

    assert_eq!(page.limit, 100);
    assert_eq!(page.offset, 0);
    assert_eq!(page.products[0].id.as_str(), "p2");
}

struct StaticCategories;

#[async_trait]
impl CategorySource for StaticCategories {
    async fn fetch(&self) -> Result<CategoryResponse, CatalogError> {
        Ok(CategoryResponse {
            categories: vec![
                RawCategory {
                    id: CategoryId::new("1"),
                    name: "Bijoux".to_string(),
                    handle: "bijoux".to_string(),
                    parent_id: None,
                    product_count: 24,
                },
                RawCategory {
                    id: CategoryId::new("2"),
                    name: "Bagues".to_string(),
                    handle: "bagues".to_string(),
                    parent_id: Some(CategoryId::new("1")),
                    product_count: 9,
                },
                RawCategory {
                    id: CategoryId::new("3"),
                    name: "Bagues de fiançailles".to_string(),
                    handle: "bagues-fiancailles".to_string(),
                    parent_id: Some(CategoryId::new("2")),
                    product_count: 4,
                },
            ],
        })
    }
}

#[tokio::test]
async fn breadcrumbs_come_from_the_shared_snapshot() {
    let service = Arc::new(CategoryService::new(Arc::new(StaticCategories)));
    let snapshot = service.get().await.unwrap();

    let trail = snapshot.index.breadcrumb_trail("bagues-fiancailles");
    let handles: Vec<&str> = trail.iter().map(|b| b.handle.as_str()).collect();
    assert_eq!(handles, vec!["bijoux", "bagues", "bagues-fiancailles"]);

    let envelope = snapshot.tree_envelope();
    assert_eq!(envelope.total, 3);
    assert_eq!(envelope.tree.len(), 1);
    assert_eq!(envelope.tree[0].children[0].children.len(), 1);
}
