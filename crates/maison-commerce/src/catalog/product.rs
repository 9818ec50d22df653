//! Normalized product shape served to the storefront.
//!
//! Every search backend maps its own wire shape to this one; nothing
//! downstream ever sees a backend-specific field name.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use crate::money::{Currency, Money};

/// Display price of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductPrice {
    /// Amount in smallest currency unit.
    pub amount: i64,
    pub currency: Currency,
    /// Pre-formatted display string (e.g., "€1 250.00").
    pub formatted: String,
}

impl ProductPrice {
    pub fn from_money(money: Money) -> Self {
        Self {
            amount: money.amount_cents,
            currency: money.currency,
            formatted: money.display(),
        }
    }

    pub fn as_money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }
}

/// A product in the unified catalog shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: ProductPrice,
    pub in_stock: bool,
    #[serde(default)]
    pub total_inventory: i64,
    /// Category handles the product belongs to, including every ancestor
    /// handle, so parent-category filters match descendant-only products.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix timestamp of catalog publication.
    #[serde(default)]
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_money() {
        let price = ProductPrice::from_money(Money::new(125000, Currency::EUR));
        assert_eq!(price.amount, 125000);
        assert_eq!(price.formatted, "\u{20ac}1250.00");
        assert_eq!(price.as_money().amount_cents, 125000);
    }
}
