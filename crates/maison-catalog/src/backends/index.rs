//! Primary backend: the dedicated search index.
//!
//! Speaks a filter-expression DSL over POST and returns camelCase hits with
//! a facet distribution whose hierarchical category counts are spread over
//! `categories.lvlN` keys. Some index deployments serialize booleans as
//! strings ("true"), which the deserializer tolerates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use maison_commerce::catalog::{Product, ProductPrice};
use maison_commerce::money::{Currency, Money};
use maison_commerce::search::{
    price_range_facets, FacetCount, ProductQuery, SearchFacets, SearchOutcome, SortOption,
};
use maison_commerce::ProductId;
use maison_data::{ApiClient, RequestOptions};

use crate::backend::SearchBackend;
use crate::error::CatalogError;

const SEARCH_PATH: &str = "/indexes/products/search";

/// Query-DSL request body.
#[derive(Debug, Serialize)]
struct IndexRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<String>,
    filter: Vec<String>,
    sort: Vec<String>,
    limit: i64,
    offset: i64,
    facets: Vec<String>,
}

/// A boolean the index may serialize as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Str(String),
    Int(i64),
}

impl LooseBool {
    fn as_bool(&self) -> bool {
        match self {
            LooseBool::Bool(b) => *b,
            LooseBool::Str(s) => s == "true" || s == "1",
            LooseBool::Int(i) => *i != 0,
        }
    }
}

fn default_stock() -> LooseBool {
    LooseBool::Bool(false)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexHit {
    id: String,
    title: String,
    handle: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    price_cents: i64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default = "default_stock")]
    has_stock: LooseBool,
    #[serde(default)]
    inventory: i64,
    /// The product's category handles including every ancestor handle.
    #[serde(default)]
    category_handles: Vec<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    created_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexResponse {
    hits: Vec<IndexHit>,
    #[serde(default)]
    estimated_total_hits: Option<i64>,
    #[serde(default)]
    facet_distribution: HashMap<String, HashMap<String, i64>>,
}

/// Adapter for the primary search index.
pub struct IndexSearchBackend {
    client: Arc<ApiClient>,
}

impl IndexSearchBackend {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn build_request(query: &ProductQuery) -> IndexRequest {
        let mut filter = Vec::new();
        if let Some(category) = &query.category {
            // Matches the ancestor-handle list, so parent categories include
            // descendant-only products.
            filter.push(format!("categoryHandles = \"{}\"", category));
        }
        if let Some(brand) = &query.brand {
            filter.push(format!("brand = \"{}\"", brand));
        }
        if let Some(min) = query.min_price {
            filter.push(format!("priceCents >= {}", min.amount_cents));
        }
        if let Some(max) = query.max_price {
            filter.push(format!("priceCents <= {}", max.amount_cents));
        }
        if query.in_stock_only {
            filter.push("hasStock = true".to_string());
        }

        IndexRequest {
            q: query.search.clone(),
            filter,
            sort: vec![sort_expression(query.sort).to_string()],
            limit: query.limit,
            offset: query.offset,
            facets: vec![
                "categories.lvl0".to_string(),
                "categories.lvl1".to_string(),
                "categories.lvl2".to_string(),
                "brand".to_string(),
            ],
        }
    }
}

/// Translate the unified sort into the index's `field:direction` form.
/// `Popular` has no index equivalent and uses newest ordering.
fn sort_expression(sort: SortOption) -> &'static str {
    match sort {
        SortOption::NameAsc => "title:asc",
        SortOption::NameDesc => "title:desc",
        SortOption::PriceAsc => "priceCents:asc",
        SortOption::PriceDesc => "priceCents:desc",
        SortOption::Newest | SortOption::Popular => "createdAt:desc",
    }
}

fn normalize_hit(hit: IndexHit) -> Product {
    let currency = hit
        .currency
        .as_deref()
        .and_then(Currency::from_code)
        .unwrap_or_default();

    Product {
        id: ProductId::new(hit.id),
        title: hit.title,
        handle: hit.handle,
        subtitle: hit.subtitle,
        description: hit.description,
        thumbnail: hit.thumbnail,
        images: hit.images,
        price: ProductPrice::from_money(Money::new(hit.price_cents, currency)),
        in_stock: hit.has_stock.as_bool(),
        total_inventory: hit.inventory,
        categories: hit.category_handles,
        brand: hit.brand,
        tags: hit.tags,
        created_at: hit.created_at,
    }
}

fn normalize_facets(
    distribution: HashMap<String, HashMap<String, i64>>,
    products: &[Product],
) -> SearchFacets {
    let mut categories: HashMap<String, i64> = HashMap::new();
    let mut brands = Vec::new();

    for (field, counts) in distribution {
        if field.starts_with("categories.lvl") {
            for (value, count) in counts {
                *categories.entry(value).or_insert(0) += count;
            }
        } else if field == "brand" {
            brands.extend(
                counts
                    .into_iter()
                    .map(|(value, count)| FacetCount { value, count }),
            );
        }
    }

    let mut facets = SearchFacets {
        categories: categories
            .into_iter()
            .map(|(value, count)| FacetCount { value, count })
            .collect(),
        brands,
        price_ranges: price_range_facets(products),
    };
    facets.sort_counts();
    facets
}

#[async_trait]
impl SearchBackend for IndexSearchBackend {
    fn name(&self) -> &'static str {
        "search-index"
    }

    async fn search(&self, query: &ProductQuery) -> Result<SearchOutcome, CatalogError> {
        let request = Self::build_request(query);
        let response: IndexResponse = self
            .client
            .post(SEARCH_PATH, &request, RequestOptions::new())
            .await?;

        let total = response
            .estimated_total_hits
            .unwrap_or(response.hits.len() as i64);
        let products: Vec<Product> = response.hits.into_iter().map(normalize_hit).collect();
        let facets = normalize_facets(response.facet_distribution, &products);

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
    fn test_filter_expressions() {
        let query = ProductQuery::new()
            .with_category("bagues")
            .with_brand("Chaumet")
            .with_price_range(
                Some(Money::new(10_000, Currency::EUR)),
                Some(Money::new(500_000, Currency::EUR)),
            )
            .in_stock_only()
            .normalized();

        let request = IndexSearchBackend::build_request(&query);
        assert!(request.filter.contains(&"categoryHandles = \"bagues\"".to_string()));
        assert!(request.filter.contains(&"brand = \"Chaumet\"".to_string()));
        assert!(request.filter.contains(&"priceCents >= 10000".to_string()));
        assert!(request.filter.contains(&"priceCents <= 500000".to_string()));
        assert!(request.filter.contains(&"hasStock = true".to_string()));
    }

    #[test]
    fn test_sort_mapping() {
        assert_eq!(sort_expression(SortOption::PriceAsc), "priceCents:asc");
        assert_eq!(sort_expression(SortOption::NameDesc), "title:desc");
        // Popular has no native equivalent.
        assert_eq!(
            sort_expression(SortOption::Popular),
            sort_expression(SortOption::Newest)
        );
    }

    #[test]
    fn test_stringly_boolean_tolerated() {
        let raw = r#"{
            "hits": [
                {"id": "p1", "title": "Bague", "handle": "bague", "priceCents": 125000,
                 "hasStock": "true", "inventory": 3, "categoryHandles": ["bijoux", "bagues"]},
                {"id": "p2", "title": "Collier", "handle": "collier", "priceCents": 98000,
                 "hasStock": false}
            ],
            "estimatedTotalHits": 2,
            "facetDistribution": {}
        }"#;

        let response: IndexResponse = serde_json::from_str(raw).unwrap();
        let products: Vec<Product> = response.hits.into_iter().map(normalize_hit).collect();
        assert!(products[0].in_stock);
        assert!(!products[1].in_stock);
        assert_eq!(products[0].categories, vec!["bijoux", "bagues"]);
    }

    #[test]
    fn test_hierarchical_facet_keys_merged() {
        let raw = r#"{
            "hits": [],
            "facetDistribution": {
                "categories.lvl0": {"bijoux": 12},
                "categories.lvl1": {"bagues": 7, "colliers": 5},
                "brand": {"Chaumet": 4}
            }
        }"#;
        let response: IndexResponse = serde_json::from_str(raw).unwrap();
        let facets = normalize_facets(response.facet_distribution, &[]);

        assert_eq!(facets.categories.len(), 3);
        // Sorted descending by count.
        assert_eq!(facets.categories[0].value, "bijoux");
        assert_eq!(facets.brands[0].value, "Chaumet");
        assert_eq!(facets.price_ranges.len(), 6);
    }
}
