//! Secondary backend: the origin store API.
//!
//! A plain REST GET with repeated query keys. Field names differ from the
//! index (`name` vs `title`, `slug` vs `handle`, decimal amounts instead of
//! cents) and facets arrive as flat count maps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use maison_commerce::catalog::{Product, ProductPrice};
use maison_commerce::money::{Currency, Money};
use maison_commerce::search::{
    price_range_facets, FacetCount, ProductQuery, SearchFacets, SearchOutcome, SortOption,
};
use maison_commerce::ProductId;
use maison_data::{ApiClient, RequestOptions};

use crate::backend::SearchBackend;
use crate::error::CatalogError;

const PRODUCTS_PATH: &str = "/store/products";

#[derive(Debug, Deserialize)]
struct StoreMoney {
    amount: f64,
    #[serde(default)]
    currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoreProduct {
    id: String,
    name: String,
    slug: String,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    gallery: Vec<String>,
    unit_price: StoreMoney,
    #[serde(default)]
    in_stock: bool,
    #[serde(default)]
    stock_quantity: i64,
    /// Full category path, root first; doubles as the ancestor-handle list.
    #[serde(default)]
    category_path: Vec<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    published_at: i64,
}

#[derive(Debug, Deserialize, Default)]
struct StoreFacets {
    #[serde(default)]
    category_counts: HashMap<String, i64>,
    #[serde(default)]
    brand_counts: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct StoreProductsResponse {
    products: Vec<StoreProduct>,
    count: i64,
    #[serde(default)]
    facets: Option<StoreFacets>,
}

/// Adapter for the origin store API.
pub struct StoreApiBackend {
    client: Arc<ApiClient>,
}

impl StoreApiBackend {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn build_options(query: &ProductQuery) -> RequestOptions {
        let (sort_by, order) = sort_fields(query.sort);
        let mut options = RequestOptions::new()
            .param("sort_by", sort_by)
            .param("order", order)
            .param("limit", query.limit)
            .param("offset", query.offset);

        if let Some(category) = &query.category {
            options = options.param("category", category);
        }
        if let Some(brand) = &query.brand {
            options = options.param("brand", brand);
        }
        if let Some(min) = query.min_price {
            options = options.param("min_price", min.amount_cents);
        }
        if let Some(max) = query.max_price {
            options = options.param("max_price", max.amount_cents);
        }
        if let Some(text) = &query.search {
            options = options.param("q", text);
        }
        if query.in_stock_only {
            options = options.param("in_stock", "true");
        }
        options
    }
}

/// Translate the unified sort into the store API's `sort_by` + `order`
/// pair. `Popular` falls back to newest.
fn sort_fields(sort: SortOption) -> (&'static str, &'static str) {
    match sort {
        SortOption::NameAsc => ("name", "asc"),
        SortOption::NameDesc => ("name", "desc"),
        SortOption::PriceAsc => ("unit_price", "asc"),
        SortOption::PriceDesc => ("unit_price", "desc"),
        SortOption::Newest | SortOption::Popular => ("published_at", "desc"),
    }
}

fn normalize_product(p: StoreProduct) -> Product {
    let currency = p
        .unit_price
        .currency_code
        .as_deref()
        .and_then(Currency::from_code)
        .unwrap_or_default();

    Product {
        id: ProductId::new(p.id),
        title: p.name,
        handle: p.slug,
        subtitle: p.tagline,
        description: p.body_html,
        thumbnail: p.image,
        images: p.gallery,
        price: ProductPrice::from_money(Money::from_decimal(p.unit_price.amount, currency)),
        in_stock: p.in_stock,
        total_inventory: p.stock_quantity,
        categories: p.category_path,
        brand: p.manufacturer,
        tags: p.labels,
        created_at: p.published_at,
    }
}

fn counts_to_facets(counts: HashMap<String, i64>) -> Vec<FacetCount> {
    counts
        .into_iter()
        .map(|(value, count)| FacetCount { value, count })
        .collect()
}

#[async_trait]
impl SearchBackend for StoreApiBackend {
    fn name(&self) -> &'static str {
        "store-api"
    }

    async fn search(&self, query: &ProductQuery) -> Result<SearchOutcome, CatalogError> {
        let response: StoreProductsResponse = self
            .client
            .get(PRODUCTS_PATH, Self::build_options(query))
            .await?;

        let total = response.count;
        let products: Vec<Product> = response
            .products
            .into_iter()
            .map(normalize_product)
            .collect();

        let store_facets = response.facets.unwrap_or_default();
        let mut facets = SearchFacets {
            categories: counts_to_facets(store_facets.category_counts),
            brands: counts_to_facets(store_facets.brand_counts),
            price_ranges: price_range_facets(&products),
        };
        facets.sort_counts();

        Ok(SearchOutcome {
            products,
            total,
            facets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = ProductQuery::new()
            .with_category("colliers")
            .with_search("perle")
            .with_sort(SortOption::PriceDesc)
            .in_stock_only()
            .normalized();

        let options = StoreApiBackend::build_options(&query);
        let has = |k: &str, v: &str| {
            options
                .params
                .iter()
                .any(|(name, value)| name == k && value == v)
        };
        assert!(has("category", "colliers"));
        assert!(has("q", "perle"));
        assert!(has("sort_by", "unit_price"));
        assert!(has("order", "desc"));
        assert!(has("in_stock", "true"));
        assert!(has("limit", "20"));
    }

    #[test]
    fn test_popular_sort_falls_back_to_newest() {
        assert_eq!(sort_fields(SortOption::Popular), ("published_at", "desc"));
    }

    #[test]
    fn test_normalization_maps_fields() {
        let raw = r#"{
            "products": [{
                "id": "sp-1",
                "name": "Collier perles Akoya",
                "slug": "collier-perles-akoya",
                "tagline": "Or 18 carats",
                "image": "https://cdn.example/akoya.jpg",
                "unit_price": {"amount": 2490.00, "currency_code": "EUR"},
                "in_stock": true,
                "stock_quantity": 4,
                "category_path": ["bijoux", "colliers"],
                "manufacturer": "Mikimoto",
                "labels": ["perle"],
                "published_at": 1700000000
            }],
            "count": 1,
            "facets": {"brand_counts": {"Mikimoto": 1}}
        }"#;

        let response: StoreProductsResponse = serde_json::from_str(raw).unwrap();
        let product = normalize_product(response.products.into_iter().next().unwrap());

        assert_eq!(product.title, "Collier perles Akoya");
        assert_eq!(product.handle, "collier-perles-akoya");
        assert_eq!(product.price.amount, 249_000);
        assert_eq!(product.brand.as_deref(), Some("Mikimoto"));
        assert_eq!(product.categories, vec!["bijoux", "colliers"]);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let raw = r#"{
            "products": [{
                "id": "sp-2",
                "name": "Bracelet",
                "slug": "bracelet",
                "unit_price": {"amount": 350.0}
            }],
            "count": 1
        }"#;
        let response: StoreProductsResponse = serde_json::from_str(raw).unwrap();
        let product = normalize_product(response.products.into_iter().next().unwrap());

        assert!(!product.in_stock);
        assert_eq!(product.price.currency, Currency::EUR);
        assert!(product.categories.is_empty());
    }
}
