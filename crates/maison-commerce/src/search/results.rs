//! Unified search result and facet shapes.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// A count-by-value facet entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetCount {
    pub value: String,
    pub count: i64,
}

/// One of the fixed price-range buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRangeFacet {
    pub label: String,
    /// Inclusive lower bound, in cents.
    pub min_cents: i64,
    /// Exclusive upper bound, in cents. None for the open top bucket.
    pub max_cents: Option<i64>,
    pub count: i64,
}

/// The six price buckets offered by the filter UI. These are synthesized
/// in-process; no backend provides them.
pub const PRICE_BUCKETS: [(i64, Option<i64>); 6] = [
    (0, Some(25_000)),
    (25_000, Some(50_000)),
    (50_000, Some(100_000)),
    (100_000, Some(250_000)),
    (250_000, Some(500_000)),
    (500_000, None),
];

fn bucket_label(min_cents: i64, max_cents: Option<i64>) -> String {
    match max_cents {
        Some(max) => format!("{} - {} \u{20ac}", min_cents / 100, max / 100),
        None => format!("{} \u{20ac} +", min_cents / 100),
    }
}

/// Count products into the fixed buckets.
pub fn price_range_facets(products: &[Product]) -> Vec<PriceRangeFacet> {
    PRICE_BUCKETS
        .iter()
        .map(|&(min, max)| PriceRangeFacet {
            label: bucket_label(min, max),
            min_cents: min,
            max_cents: max,
            count: products
                .iter()
                .filter(|p| {
                    p.price.amount >= min && max.map(|m| p.price.amount < m).unwrap_or(true)
                })
                .count() as i64,
        })
        .collect()
}

/// Facets in the unified shape, counts sorted descending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchFacets {
    pub categories: Vec<FacetCount>,
    pub brands: Vec<FacetCount>,
    pub price_ranges: Vec<PriceRangeFacet>,
}

impl SearchFacets {
    /// Empty facets with the default (zero-count) price buckets.
    pub fn default_facets() -> Self {
        Self {
            categories: Vec::new(),
            brands: Vec::new(),
            price_ranges: price_range_facets(&[]),
        }
    }

    /// Sort category and brand counts descending (ties by value for
    /// determinism).
    pub fn sort_counts(&mut self) {
        let by_count = |a: &FacetCount, b: &FacetCount| {
            b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value))
        };
        self.categories.sort_by(by_count);
        self.brands.sort_by(by_count);
    }
}

impl Default for SearchFacets {
    fn default() -> Self {
        Self::default_facets()
    }
}

/// One backend's normalized search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOutcome {
    pub products: Vec<Product>,
    pub total: i64,
    pub facets: SearchFacets,
}

impl SearchOutcome {
    /// The degraded result returned when every backend fails: empty but
    /// valid, with default price-range facets.
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            total: 0,
            facets: SearchFacets::default_facets(),
        }
    }
}

/// Response envelope of `GET /api/catalog/products`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub facets: SearchFacets,
    pub limit: i64,
    pub offset: i64,
}

impl ProductsPage {
    pub fn from_outcome(outcome: SearchOutcome, limit: i64, offset: i64) -> Self {
        Self {
            products: outcome.products,
            total: outcome.total,
            facets: outcome.facets,
            limit,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductPrice;
    use crate::ids::ProductId;
    use crate::money::{Currency, Money};

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: id.to_string(),
            handle: id.to_string(),
            subtitle: None,
            description: None,
            thumbnail: None,
            images: Vec::new(),
            price: ProductPrice::from_money(Money::new(cents, Currency::EUR)),
            in_stock: true,
            total_inventory: 1,
            categories: Vec::new(),
            brand: None,
            tags: Vec::new(),
            created_at: 0,
        }
    }

    #[test]
    fn test_six_buckets_always_present() {
        let facets = SearchFacets::default_facets();
        assert_eq!(facets.price_ranges.len(), 6);
        assert!(facets.price_ranges.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_bucket_counting() {
        let products = vec![
            product("p1", 10_000),   // 0-250
            product("p2", 30_000),   // 250-500
            product("p3", 40_000),   // 250-500
            product("p4", 600_000),  // 5000+
        ];
        let buckets = price_range_facets(&products);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[5].count, 1);
    }

    #[test]
    fn test_bucket_bounds_are_half_open() {
        let products = vec![product("edge", 25_000)];
        let buckets = price_range_facets(&products);
        assert_eq!(buckets[0].count, 0);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_sort_counts_descending() {
        let mut facets = SearchFacets {
            categories: vec![
                FacetCount { value: "bagues".into(), count: 2 },
                FacetCount { value: "colliers".into(), count: 9 },
            ],
            brands: Vec::new(),
            price_ranges: Vec::new(),
        };
        facets.sort_counts();
        assert_eq!(facets.categories[0].value, "colliers");
    }

    #[test]
    fn test_empty_outcome_shape() {
        let outcome = SearchOutcome::empty();
        assert!(outcome.products.is_empty());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.facets.price_ranges.len(), 6);
    }
}
