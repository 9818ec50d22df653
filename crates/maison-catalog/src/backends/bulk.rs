//! Final fallback backend: bulk export with in-process filtering.
//!
//! Fetches the unfiltered product export once per query and applies
//! filtering, sorting, pagination and facet counting locally. Slow but
//! dependable; it only runs when both search backends are down.

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

const EXPORT_PATH: &str = "/api/products/export";

#[derive(Debug, Deserialize)]
struct ExportRow {
    reference: String,
    label: String,
    slug: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    media: Vec<String>,
    price_ht_cents: i64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    stock: i64,
    /// Category handles including ancestors.
    #[serde(default)]
    category_handles: Vec<String>,
    #[serde(default)]
    maker: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    listed_at: i64,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    items: Vec<ExportRow>,
}

/// Adapter for the bulk product export.
pub struct BulkExportBackend {
    client: Arc<ApiClient>,
}

impl BulkExportBackend {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

fn normalize_row(row: ExportRow) -> Product {
    let currency = row
        .currency
        .as_deref()
        .and_then(Currency::from_code)
        .unwrap_or_default();

    Product {
        id: ProductId::new(row.reference),
        title: row.label,
        handle: row.slug,
        subtitle: row.summary,
        description: row.detail,
        thumbnail: row.media.first().cloned(),
        images: row.media,
        price: ProductPrice::from_money(Money::new(row.price_ht_cents, currency)),
        in_stock: row.stock > 0,
        total_inventory: row.stock,
        categories: row.category_handles,
        brand: row.maker,
        tags: row.keywords,
        created_at: row.listed_at,
    }
}

fn matches(product: &Product, query: &ProductQuery) -> bool {
    if let Some(category) = &query.category {
        // Ancestor-handle match: a parent category includes products
        // assigned only to its descendants.
        if !product.categories.iter().any(|h| h == category) {
            return false;
        }
    }
    if let Some(brand) = &query.brand {
        if !product
            .brand
            .as_deref()
            .map(|b| b.eq_ignore_ascii_case(brand))
            .unwrap_or(false)
        {
            return false;
        }
    }
    if let Some(min) = query.min_price {
        if product.price.amount < min.amount_cents {
            return false;
        }
    }
    if let Some(max) = query.max_price {
        if product.price.amount > max.amount_cents {
            return false;
        }
    }
    if let Some(text) = &query.search {
        let needle = text.to_lowercase();
        let in_title = product.title.to_lowercase().contains(&needle);
        let in_description = product
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if !in_title && !in_description {
            return false;
        }
    }
    if query.in_stock_only && !product.in_stock {
        return false;
    }
    true
}

fn apply_sort(products: &mut [Product], sort: SortOption) {
    match sort {
        SortOption::NameAsc => {
            products.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
        SortOption::NameDesc => {
            products.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()))
        }
        SortOption::PriceAsc => products.sort_by_key(|p| p.price.amount),
        SortOption::PriceDesc => products.sort_by_key(|p| std::cmp::Reverse(p.price.amount)),
        // Popular has no signal in the export; newest stands in.
        SortOption::Newest | SortOption::Popular => {
            products.sort_by_key(|p| std::cmp::Reverse(p.created_at))
        }
    }
}

fn count_facets(products: &[Product]) -> SearchFacets {
    let mut categories: HashMap<&str, i64> = HashMap::new();
    let mut brands: HashMap<&str, i64> = HashMap::new();
    for product in products {
        for handle in &product.categories {
            *categories.entry(handle.as_str()).or_insert(0) += 1;
        }
        if let Some(brand) = &product.brand {
            *brands.entry(brand.as_str()).or_insert(0) += 1;
        }
    }

    let to_counts = |m: HashMap<&str, i64>| {
        m.into_iter()
            .map(|(value, count)| FacetCount {
                value: value.to_string(),
                count,
            })
            .collect::<Vec<_>>()
    };

    let mut facets = SearchFacets {
        categories: to_counts(categories),
        brands: to_counts(brands),
        price_ranges: price_range_facets(products),
    };
    facets.sort_counts();
    facets
}

#[async_trait]
impl SearchBackend for BulkExportBackend {
    fn name(&self) -> &'static str {
        "bulk-export"
    }

    async fn search(&self, query: &ProductQuery) -> Result<SearchOutcome, CatalogError> {
        let response: ExportResponse = self
            .client
            .get(EXPORT_PATH, RequestOptions::new())
            .await?;

        let mut filtered: Vec<Product> = response
            .items
            .into_iter()
            .map(normalize_row)
            .filter(|p| matches(p, query))
            .collect();

        apply_sort(&mut filtered, query.sort);

        let total = filtered.len() as i64;
        let facets = count_facets(&filtered);

        let start = (query.offset.max(0) as usize).min(filtered.len());
        let end = (start + query.limit.max(0) as usize).min(filtered.len());
        let products = filtered[start..end].to_vec();

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

    fn product(
        id: &str,
        title: &str,
        cents: i64,
        categories: &[&str],
        brand: Option<&str>,
        stock: i64,
        listed_at: i64,
    ) -> Product {
        normalize_row(ExportRow {
            reference: id.to_string(),
            label: title.to_string(),
            slug: id.to_string(),
            summary: None,
            detail: None,
            media: Vec::new(),
            price_ht_cents: cents,
            currency: None,
            stock,
            category_handles: categories.iter().map(|s| s.to_string()).collect(),
            maker: brand.map(String::from),
            keywords: Vec::new(),
            listed_at,
        })
    }

    fn sample() -> Vec<Product> {
        vec![
            product("p1", "Bague solitaire", 250_000, &["bijoux", "bagues"], Some("Chaumet"), 3, 100),
            product("p2", "Bague jonc", 90_000, &["bijoux", "bagues"], Some("Dinh Van"), 0, 300),
            product("p3", "Collier perles", 180_000, &["bijoux", "colliers"], Some("Mikimoto"), 5, 200),
        ]
    }

    #[test]
    fn test_parent_category_includes_descendants() {
        let query = ProductQuery::new().with_category("bijoux").normalized();
        assert_eq!(sample().iter().filter(|p| matches(p, &query)).count(), 3);

        let query = ProductQuery::new().with_category("bagues").normalized();
        assert_eq!(sample().iter().filter(|p| matches(p, &query)).count(), 2);
    }

    #[test]
    fn test_price_and_stock_filters() {
        let query = ProductQuery::new()
            .with_price_range(Some(Money::new(100_000, Currency::EUR)), None)
            .normalized();
        assert_eq!(sample().iter().filter(|p| matches(p, &query)).count(), 2);

        let query = ProductQuery::new().in_stock_only().normalized();
        assert_eq!(sample().iter().filter(|p| matches(p, &query)).count(), 2);
    }

    #[test]
    fn test_text_filter_case_insensitive() {
        let query = ProductQuery::new().with_search("BAGUE").normalized();
        assert_eq!(sample().iter().filter(|p| matches(p, &query)).count(), 2);
    }

    #[test]
    fn test_sorting() {
        let mut products = sample();
        apply_sort(&mut products, SortOption::PriceAsc);
        assert_eq!(products[0].id.as_str(), "p2");

        apply_sort(&mut products, SortOption::Newest);
        assert_eq!(products[0].id.as_str(), "p2"); // listed_at 300

        apply_sort(&mut products, SortOption::NameAsc);
        assert_eq!(products[0].title, "Bague jonc");
    }

    #[test]
    fn test_facet_counts_descending() {
        let facets = count_facets(&sample());
        assert_eq!(facets.categories[0].value, "bijoux");
        assert_eq!(facets.categories[0].count, 3);
        assert_eq!(facets.brands.len(), 3);
    }

    #[test]
    fn test_pagination_bounds() {
        let rows = ExportResponse {
            items: Vec::new(),
        };
        // Offset past the end yields an empty page rather than a panic.
        let mut filtered: Vec<Product> = rows.items.into_iter().map(normalize_row).collect();
        apply_sort(&mut filtered, SortOption::Newest);
        let start = (10usize).min(filtered.len());
        assert_eq!(&filtered[start..], &[] as &[Product]);
    }
}
