//! Normalized search query and result shapes shared by every backend.

mod query;
mod results;

pub use query::{ProductQuery, SortOption, DEFAULT_LIMIT, MAX_LIMIT};
pub use results::{
    price_range_facets, FacetCount, PriceRangeFacet, ProductsPage, SearchFacets, SearchOutcome,
    PRICE_BUCKETS,
};
