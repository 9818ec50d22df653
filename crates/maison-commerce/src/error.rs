//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in commerce operations.
///
/// Validation outcomes (insufficient stock, unknown promo code) are NOT
/// errors; they are returned as result values by the cart store. This enum
/// covers genuine failures: arithmetic, serialization, storage.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Saved cart not found.
    #[error("Saved cart not found: {0}")]
    SavedCartNotFound(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Persistence layer failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<maison_cache::CacheError> for CommerceError {
    fn from(e: maison_cache::CacheError) -> Self {
        CommerceError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}
