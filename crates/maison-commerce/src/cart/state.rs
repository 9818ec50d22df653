//! Cart state and derived totals.
//!
//! Totals are never stored independently of the item list: every mutation
//! runs [`recompute_totals`] over the items, and persisted totals are
//! recomputed on load before use. Keeping totals a pure function of
//! `(items, promo)` is what prevents drift.

use serde::{Deserialize, Serialize};

use crate::ids::{CartId, ProductId, VariantId, WarehouseId};
use crate::money::{Currency, Money};
use crate::pricing::VolumeDiscount;
use crate::stock::StockStatus;

/// Cart lifetime: carts untouched for longer than this are discarded on load.
pub const CART_TTL_SECS: i64 = 72 * 3600;

/// One product (optionally one variant) held in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Variant, when the product has variants.
    pub variant_id: Option<VariantId>,
    /// Product name (denormalized for display).
    pub name: String,
    /// Quantity, always >= 1.
    pub quantity: i64,
    /// Catalog base unit price (tax-excluded), kept for repricing.
    pub base_price_ht: Money,
    /// Effective tax-excluded unit price at the current quantity.
    pub unit_price_ht: Money,
    /// Effective tax-included unit price.
    pub unit_price_ttc: Money,
    /// Undiscounted unit price; present only when a discount applied.
    pub original_price_ht: Option<Money>,
    /// The volume tier baked into the unit price, if any.
    pub volume_discount: Option<VolumeDiscount>,
    /// Stock status at validation time.
    pub stock_status: StockStatus,
    /// Available quantity at validation time.
    pub available: i64,
    /// Fulfilling warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Free-text order notes.
    pub notes: Option<String>,
    /// Unix timestamp the line was added.
    pub added_at: i64,
    /// Line total, always `unit_price_ht * quantity`.
    pub total_price_ht: Money,
}

impl CartItem {
    /// Exact identity match on `(product_id, variant_id)`.
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.product_id == *product_id && self.variant_id.as_ref() == variant_id
    }

    /// Restore the line-total invariant after a quantity or price change.
    pub fn update_total(&mut self) {
        self.total_price_ht = self
            .unit_price_ht
            .try_multiply(self.quantity)
            .unwrap_or(Money::zero(self.unit_price_ht.currency));
    }
}

/// An applied promo code. The discount amount is derived at recompute time
/// from the percent, so it tracks the current subtotal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoCode {
    /// Canonical (uppercased) code.
    pub code: String,
    /// Discount percent off the HT subtotal.
    pub percent: f64,
}

/// Kind of a discount line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Promo,
    Tier,
    Volume,
}

/// One entry of the rebuilt discount list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountLine {
    pub kind: DiscountKind,
    pub label: String,
    pub amount_ht: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Aggregate totals, always derived from the item list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartTotals {
    /// Number of distinct lines.
    pub item_count: usize,
    /// Sum of line quantities.
    pub total_quantity: i64,
    /// Sum of `unit_price_ht * quantity` across lines.
    pub subtotal_ht: Money,
    /// Sum of `unit_price_ttc * quantity` across lines.
    pub subtotal_ttc: Money,
    /// Sum of the discount lines below.
    pub total_discount_ht: Money,
    /// Tax owed on the discounted total.
    pub tax_amount: Money,
    /// `subtotal_ht - total_discount_ht`.
    pub total_ht: Money,
    /// `total_ht` with tax, rounded independently.
    pub total_ttc: Money,
    /// Discount list, rebuilt from scratch on every recomputation.
    pub discounts: Vec<DiscountLine>,
}

impl CartTotals {
    pub fn empty(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            item_count: 0,
            total_quantity: 0,
            subtotal_ht: zero,
            subtotal_ttc: zero,
            total_discount_ht: zero,
            tax_amount: zero,
            total_ht: zero,
            total_ttc: zero,
            discounts: Vec::new(),
        }
    }
}

/// Recompute aggregate totals from the item list and the applied promo.
///
/// This is the single source of truth for every derived field; callers run
/// it unconditionally after each mutation and never patch totals
/// incrementally.
pub fn recompute_totals(
    items: &[CartItem],
    promo: Option<&PromoCode>,
    tax_rate: f64,
    currency: Currency,
) -> CartTotals {
    let subtotal_ht = Money::try_sum(items.iter().map(|i| &i.total_price_ht), currency)
        .unwrap_or(Money::zero(currency));

    let subtotal_ttc = items
        .iter()
        .fold(Money::zero(currency), |acc, item| {
            let line_ttc = item
                .unit_price_ttc
                .try_multiply(item.quantity)
                .unwrap_or(Money::zero(currency));
            acc.try_add(&line_ttc).unwrap_or(acc)
        });

    let mut discounts = Vec::new();
    if let Some(promo) = promo {
        let amount = subtotal_ht.percentage(promo.percent);
        discounts.push(DiscountLine {
            kind: DiscountKind::Promo,
            label: promo.code.clone(),
            amount_ht: amount,
            percentage: Some(promo.percent),
        });
    }

    let total_discount_ht = Money::try_sum(discounts.iter().map(|d| &d.amount_ht), currency)
        .unwrap_or(Money::zero(currency));

    let total_ht = subtotal_ht
        .try_subtract(&total_discount_ht)
        .unwrap_or(subtotal_ht)
        .clamp_non_negative();
    let total_ttc = total_ht.with_tax(tax_rate);
    let tax_amount = total_ttc
        .try_subtract(&total_ht)
        .unwrap_or(Money::zero(currency));

    CartTotals {
        item_count: items.len(),
        total_quantity: items.iter().map(|i| i.quantity).sum(),
        subtotal_ht,
        subtotal_ttc,
        total_discount_ht,
        tax_amount,
        total_ht,
        total_ttc,
        discounts,
    }
}

/// The whole cart: items, promo, derived totals, lifecycle timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartState {
    /// Unique cart identifier, replaced on clear and on expiry.
    pub id: CartId,
    /// Lines in the cart.
    pub items: Vec<CartItem>,
    /// Applied promo code, if any.
    pub promo: Option<PromoCode>,
    /// Derived totals; see [`recompute_totals`].
    pub totals: CartTotals,
    /// Cart currency.
    pub currency: Currency,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last mutation.
    pub updated_at: i64,
    /// Unix timestamp past which the cart is discarded on load.
    pub expires_at: i64,
}

impl CartState {
    /// Create a fresh empty cart.
    pub fn new(currency: Currency) -> Self {
        let now = current_timestamp();
        Self {
            id: CartId::generate(),
            items: Vec::new(),
            promo: None,
            totals: CartTotals::empty(currency),
            currency,
            created_at: now,
            updated_at: now,
            expires_at: now + CART_TTL_SECS,
        }
    }

    /// Whether the cart has passed its expiry.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Refresh mutation and expiry timestamps.
    pub fn touch(&mut self) {
        let now = current_timestamp();
        self.updated_at = now;
        self.expires_at = now + CART_TTL_SECS;
    }

    /// Recompute totals and refresh timestamps. Called after every mutation.
    pub fn recompute(&mut self, tax_rate: f64) {
        self.totals = recompute_totals(&self.items, self.promo.as_ref(), tax_rate, self.currency);
        self.touch();
    }

    /// Find a line by exact `(product, variant)` identity.
    pub fn find(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Option<&CartItem> {
        self.items.iter().find(|i| i.matches(product_id, variant_id))
    }

    /// First line for a product, regardless of variant.
    ///
    /// When a product has several variants in the cart this returns the
    /// earliest-added one; callers that care about a specific variant must
    /// use [`find`](Self::find).
    pub fn find_any_variant(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == *product_id)
    }
}

/// Get current Unix timestamp.
pub(crate) fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
