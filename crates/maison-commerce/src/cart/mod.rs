//! Shopping cart: state, totals, store service, saved snapshots.

mod saved;
mod state;
mod store;

pub use saved::{SavedCart, SavedCartStore, SAVED_CARTS_STORAGE_KEY};
pub use state::{
    recompute_totals, CartItem, CartState, CartTotals, DiscountKind, DiscountLine, PromoCode,
    CART_TTL_SECS,
};
pub use store::{AddToCartOptions, CartStore, ProductSnapshot, CART_STORAGE_KEY};
