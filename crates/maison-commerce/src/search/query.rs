//! Normalized product query.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Default page size.
pub const DEFAULT_LIMIT: i64 = 20;
/// Page size ceiling.
pub const MAX_LIMIT: i64 = 100;

/// Sort options for product listings.
///
/// `Popular` has no native equivalent on any backend and falls back to
/// `Newest` ordering everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
    Popular,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::NameAsc => "name_asc",
            SortOption::NameDesc => "name_desc",
            SortOption::PriceAsc => "price_asc",
            SortOption::PriceDesc => "price_desc",
            SortOption::Newest => "newest",
            SortOption::Popular => "popular",
        }
    }

    /// Parse the query-string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name_asc" => Some(SortOption::NameAsc),
            "name_desc" => Some(SortOption::NameDesc),
            "price_asc" => Some(SortOption::PriceAsc),
            "price_desc" => Some(SortOption::PriceDesc),
            "newest" => Some(SortOption::Newest),
            "popular" => Some(SortOption::Popular),
            _ => None,
        }
    }
}

/// A normalized product query, backend-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProductQuery {
    /// Category handle; matches the product's full ancestor-handle list, so
    /// a parent category includes descendant-only products.
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Free-text search over title/description.
    pub search: Option<String>,
    pub sort: SortOption,
    pub limit: i64,
    pub offset: i64,
    pub in_stock_only: bool,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, handle: impl Into<String>) -> Self {
        self.category = Some(handle.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.search = Some(text);
        }
        self
    }

    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_pagination(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    /// Clamp pagination to the documented bounds: limit in [1, 100]
    /// (default 20 when unset), offset >= 0.
    pub fn normalized(mut self) -> Self {
        self.limit = if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit.clamp(1, MAX_LIMIT)
        };
        self.offset = self.offset.max(0);
        self
    }

    /// The full filter set as ordered `(name, value)` pairs, for cache
    /// keying. Every field participates so distinct queries never collide.
    pub fn cache_parts(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category", self.category.clone().unwrap_or_default()),
            ("brand", self.brand.clone().unwrap_or_default()),
            (
                "min_price",
                self.min_price
                    .map(|m| m.amount_cents.to_string())
                    .unwrap_or_default(),
            ),
            (
                "max_price",
                self.max_price
                    .map(|m| m.amount_cents.to_string())
                    .unwrap_or_default(),
            ),
            ("search", self.search.clone().unwrap_or_default()),
            ("sort", self.sort.as_str().to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("in_stock", self.in_stock_only.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_limit_clamped() {
        assert_eq!(ProductQuery::new().with_pagination(500, 0).normalized().limit, 100);
        assert_eq!(ProductQuery::new().with_pagination(-3, 0).normalized().limit, 1);
        assert_eq!(ProductQuery::default().normalized().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_offset_clamped() {
        assert_eq!(ProductQuery::new().with_pagination(20, -10).normalized().offset, 0);
    }

    #[test]
    fn test_empty_search_ignored() {
        let q = ProductQuery::new().with_search("");
        assert!(q.search.is_none());
    }

    #[test]
    fn test_sort_parse_roundtrip() {
        for sort in [
            SortOption::NameAsc,
            SortOption::NameDesc,
            SortOption::PriceAsc,
            SortOption::PriceDesc,
            SortOption::Newest,
            SortOption::Popular,
        ] {
            assert_eq!(SortOption::parse(sort.as_str()), Some(sort));
        }
        assert_eq!(SortOption::parse("rating"), None);
    }

    #[test]
    fn test_cache_parts_cover_all_fields() {
        let a = ProductQuery::new().with_category("bagues").normalized();
        let b = ProductQuery::new()
            .with_category("bagues")
            .in_stock_only()
            .normalized();
        assert_ne!(a.cache_parts(), b.cache_parts());

        let c = ProductQuery::new()
            .with_price_range(Some(Money::new(10000, Currency::EUR)), None)
            .normalized();
        assert_ne!(a.cache_parts(), c.cache_parts());
    }
}
