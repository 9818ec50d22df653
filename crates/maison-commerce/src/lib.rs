//! Commerce domain types and logic for the maison storefront.
//!
//! This crate holds everything that computes, not fetches:
//!
//! - **Money**: cents-based amounts with HT/TTC derivation
//! - **Pricing**: price lists, tier + volume discounts, the unit price
//!   calculator
//! - **Cart**: the cart state machine, derived totals, saved snapshots
//! - **Catalog**: category hierarchy indices, normalized product shape
//! - **Search**: the backend-agnostic query and result shapes
//!
//! # Example
//!
//! ```rust,ignore
//! use maison_commerce::prelude::*;
//!
//! let mut store = CartStore::load_or_create(storage, stock, promos, calculator, tier);
//! store.add_to_cart(&product, 2, AddToCartOptions::default()).await?;
//! store.apply_promo_code("PRO20").await?;
//! println!("Total: {}", store.totals().total_ttc);
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod pricing;
pub mod promo;
pub mod search;
pub mod stock;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Pricing
    pub use crate::pricing::{
        CalculatedPrice, CustomerTier, PriceBook, PriceCalculator, PriceList, PriceOptions,
        PricingConfig, VolumeDiscount, VolumeDiscountValue,
    };

    // Cart
    pub use crate::cart::{
        AddToCartOptions, CartItem, CartState, CartStore, CartTotals, DiscountKind, DiscountLine,
        ProductSnapshot, SavedCart, SavedCartStore,
    };

    // Collaborators
    pub use crate::promo::{PromoService, StaticPromoTable};
    pub use crate::stock::{
        InMemoryStockValidator, StockCheck, StockRequest, StockStatus, StockValidator,
    };

    // Catalog
    pub use crate::catalog::{
        Breadcrumb, CategoryIndex, CategoryResponse, CategoryTreeNode, IndexedCategory, Product,
        ProductPrice, RawCategory,
    };

    // Search
    pub use crate::search::{
        FacetCount, PriceRangeFacet, ProductQuery, ProductsPage, SearchFacets, SearchOutcome,
        SortOption,
    };
}
