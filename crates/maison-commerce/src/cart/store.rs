//! Cart store: the state machine over one [`CartState`].
//!
//! All operations are synchronous state transitions except those requiring
//! stock validation, which validate first and commit only on success. The
//! full state is persisted after every successful mutation, so the durable
//! store never lags behind the last observed transition.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use maison_cache::{get_json, set_json, KvStore};
use tracing::{debug, warn};

use crate::cart::state::{current_timestamp, CartItem, CartState};
use crate::error::CommerceError;
use crate::ids::{ProductId, VariantId, WarehouseId};
use crate::money::Money;
use crate::pricing::{CustomerTier, PriceCalculator, PriceOptions};
use crate::promo::PromoService;
use crate::stock::{StockCheck, StockValidator};

/// Fixed storage key for the current cart.
pub const CART_STORAGE_KEY: &str = "maison:cart";

/// Ceiling on a single stock-validation round trip.
const STOCK_VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Catalog data needed to add a product to the cart.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    /// Catalog base unit price, tax-excluded.
    pub base_price_ht: Money,
}

/// Options for [`CartStore::add_to_cart`].
#[derive(Debug, Clone, Default)]
pub struct AddToCartOptions {
    pub variant_id: Option<VariantId>,
    pub warehouse_id: Option<WarehouseId>,
    pub notes: Option<String>,
}

/// Service owning the current cart.
pub struct CartStore {
    state: CartState,
    storage: Arc<dyn KvStore>,
    stock: Arc<dyn StockValidator>,
    promos: Arc<dyn PromoService>,
    calculator: PriceCalculator,
    tier: CustomerTier,
    validation_errors: HashMap<ProductId, String>,
}

impl CartStore {
    /// Restore the persisted cart, or start a fresh one.
    ///
    /// Malformed persisted state is treated as absence of data; an expired
    /// cart is discarded wholesale. Loaded totals are always recomputed from
    /// the items, never trusted.
    pub fn load_or_create(
        storage: Arc<dyn KvStore>,
        stock: Arc<dyn StockValidator>,
        promos: Arc<dyn PromoService>,
        calculator: PriceCalculator,
        tier: CustomerTier,
    ) -> Self {
        let currency = calculator.config().currency;
        let tax_rate = calculator.config().tax_rate;

        let state = match get_json::<CartState>(storage.as_ref(), CART_STORAGE_KEY) {
            Ok(Some(mut loaded)) => {
                if loaded.is_expired(current_timestamp()) {
                    debug!(cart_id = %loaded.id, "persisted cart expired, starting fresh");
                    CartState::new(currency)
                } else {
                    loaded.recompute(tax_rate);
                    loaded
                }
            }
            Ok(None) => CartState::new(currency),
            Err(e) => {
                warn!(error = %e, "failed to parse persisted cart, starting fresh");
                CartState::new(currency)
            }
        };

        Self {
            state,
            storage,
            stock,
            promos,
            calculator,
            tier,
            validation_errors: HashMap::new(),
        }
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn totals(&self) -> &crate::cart::state::CartTotals {
        &self.state.totals
    }

    /// Last recorded stock-validation error for a product, if any.
    pub fn validation_error(&self, product_id: &ProductId) -> Option<&str> {
        self.validation_errors.get(product_id).map(String::as_str)
    }

    /// Add a product to the cart.
    ///
    /// Returns `Ok(false)` without mutating when the quantity is invalid or
    /// stock validation fails; `Err` only on persistence failure. A line
    /// with the same `(product, variant)` identity absorbs the quantity and
    /// is repriced at the merged total.
    pub async fn add_to_cart(
        &mut self,
        product: &ProductSnapshot,
        quantity: i64,
        options: AddToCartOptions,
    ) -> Result<bool, CommerceError> {
        if quantity < 1 {
            return Ok(false);
        }

        let existing_quantity = self
            .state
            .find(&product.product_id, options.variant_id.as_ref())
            .map(|i| i.quantity)
            .unwrap_or(0);
        let new_quantity = existing_quantity.saturating_add(quantity);

        let check = self
            .check_stock(&product.product_id, new_quantity, options.warehouse_id.as_ref())
            .await;
        if !check.is_valid {
            self.record_validation_failure(&product.product_id, &check);
            return Ok(false);
        }

        let price = self.calculator.calculate(
            &product.product_id,
            product.base_price_ht,
            new_quantity,
            &self.price_options(),
        );

        if let Some(item) = self
            .state
            .items
            .iter_mut()
            .find(|i| i.matches(&product.product_id, options.variant_id.as_ref()))
        {
            item.quantity = new_quantity;
            item.unit_price_ht = price.unit_price_ht;
            item.unit_price_ttc = price.unit_price_ttc;
            item.original_price_ht = price.original_price_ht;
            item.volume_discount = price.volume_discount;
            item.stock_status = check.status();
            item.available = check.available_quantity;
            item.update_total();
        } else {
            let mut item = CartItem {
                product_id: product.product_id.clone(),
                variant_id: options.variant_id,
                name: product.name.clone(),
                quantity: new_quantity,
                base_price_ht: product.base_price_ht,
                unit_price_ht: price.unit_price_ht,
                unit_price_ttc: price.unit_price_ttc,
                original_price_ht: price.original_price_ht,
                volume_discount: price.volume_discount,
                stock_status: check.status(),
                available: check.available_quantity,
                warehouse_id: options.warehouse_id,
                notes: options.notes,
                added_at: current_timestamp(),
                total_price_ht: Money::zero(self.state.currency),
            };
            item.update_total();
            self.state.items.push(item);
        }

        self.validation_errors.remove(&product.product_id);
        self.commit()?;
        Ok(true)
    }

    /// Remove the `(product, variant)` line. Absent lines are a no-op, not
    /// an error.
    pub fn remove_from_cart(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Result<(), CommerceError> {
        self.state
            .items
            .retain(|i| !i.matches(product_id, variant_id));
        self.validation_errors.remove(product_id);
        self.commit()
    }

    /// Set a line's quantity, revalidating stock and repricing.
    ///
    /// A quantity below 1 removes the line. Returns `Ok(false)` without
    /// mutating when the line is absent or validation fails.
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        variant_id: Option<&VariantId>,
    ) -> Result<bool, CommerceError> {
        if quantity < 1 {
            self.remove_from_cart(product_id, variant_id)?;
            return Ok(true);
        }

        let Some(existing) = self.state.find(product_id, variant_id) else {
            return Ok(false);
        };
        let base_price = existing.base_price_ht;
        let warehouse = existing.warehouse_id.clone();

        let check = self
            .check_stock(product_id, quantity, warehouse.as_ref())
            .await;
        if !check.is_valid {
            self.record_validation_failure(product_id, &check);
            return Ok(false);
        }

        let price =
            self.calculator
                .calculate(product_id, base_price, quantity, &self.price_options());

        if let Some(item) = self
            .state
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
        {
            item.quantity = quantity;
            item.unit_price_ht = price.unit_price_ht;
            item.unit_price_ttc = price.unit_price_ttc;
            item.original_price_ht = price.original_price_ht;
            item.volume_discount = price.volume_discount;
            item.stock_status = check.status();
            item.available = check.available_quantity;
            item.update_total();
        }

        self.validation_errors.remove(product_id);
        self.commit()?;
        Ok(true)
    }

    /// Update a line's free-text notes. No stock check; always persists.
    pub fn update_item_notes(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        notes: Option<String>,
    ) -> Result<bool, CommerceError> {
        let Some(item) = self
            .state
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
        else {
            return Ok(false);
        };
        item.notes = notes;
        self.commit()?;
        Ok(true)
    }

    /// Move a line to another warehouse. No stock check; always persists.
    pub fn update_item_warehouse(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<bool, CommerceError> {
        let Some(item) = self
            .state
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
        else {
            return Ok(false);
        };
        item.warehouse_id = warehouse_id;
        self.commit()?;
        Ok(true)
    }

    /// Replace the state with a fresh empty cart (new id, new expiry).
    pub fn clear_cart(&mut self) -> Result<(), CommerceError> {
        self.state = CartState::new(self.state.currency);
        self.validation_errors.clear();
        self.persist()
    }

    /// Apply a promo code. Unknown codes return `Ok(false)` with no changes.
    pub async fn apply_promo_code(&mut self, code: &str) -> Result<bool, CommerceError> {
        let Some(percent) = self.promos.validate_code(code).await else {
            return Ok(false);
        };

        self.state.promo = Some(crate::cart::state::PromoCode {
            code: code.to_uppercase(),
            percent,
        });
        self.commit()?;
        Ok(true)
    }

    /// Remove the applied promo code, recomputing totals without it.
    pub fn remove_promo_code(&mut self) -> Result<(), CommerceError> {
        self.state.promo = None;
        self.commit()
    }

    /// Whether an exact `(product, variant)` line is in the cart.
    pub fn is_in_cart(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.state.find(product_id, variant_id).is_some()
    }

    /// Quantity of the exact `(product, variant)` line, 0 when absent.
    pub fn get_item_quantity(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> i64 {
        self.state
            .find(product_id, variant_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// The exact `(product, variant)` line, if present.
    pub fn get_cart_item(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Option<&CartItem> {
        self.state.find(product_id, variant_id)
    }

    /// First line for a product regardless of variant. See
    /// [`CartState::find_any_variant`] for the ordering caveat.
    pub fn get_cart_item_any_variant(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.state.find_any_variant(product_id)
    }

    /// Replace the item list wholesale (saved-cart load, account merge).
    pub fn replace_items(&mut self, items: Vec<CartItem>) -> Result<(), CommerceError> {
        self.state.items = items;
        self.validation_errors.clear();
        self.commit()
    }

    /// Merge another cart's lines into this one (e.g., guest cart at login).
    /// Same-identity lines sum their quantities and are repriced.
    pub fn merge(&mut self, other: CartState) -> Result<(), CommerceError> {
        for incoming in other.items {
            if let Some(item) = self
                .state
                .items
                .iter_mut()
                .find(|i| i.matches(&incoming.product_id, incoming.variant_id.as_ref()))
            {
                item.quantity = item.quantity.saturating_add(incoming.quantity);
            } else {
                self.state.items.push(incoming);
            }
        }

        // Reprice merged lines at their new quantities.
        let options = self.price_options();
        for item in &mut self.state.items {
            let price = self.calculator.calculate(
                &item.product_id,
                item.base_price_ht,
                item.quantity,
                &options,
            );
            item.unit_price_ht = price.unit_price_ht;
            item.unit_price_ttc = price.unit_price_ttc;
            item.original_price_ht = price.original_price_ht;
            item.volume_discount = price.volume_discount;
            item.update_total();
        }

        self.commit()
    }

    fn price_options(&self) -> PriceOptions {
        PriceOptions {
            include_volume_discount: true,
            tier: self.tier,
        }
    }

    /// Validate requested stock with the configured ceiling; an elapsed
    /// timeout counts as a failed check so the commit never happens.
    async fn check_stock(
        &self,
        product_id: &ProductId,
        quantity: i64,
        warehouse_id: Option<&WarehouseId>,
    ) -> StockCheck {
        match tokio::time::timeout(
            STOCK_VALIDATION_TIMEOUT,
            self.stock.validate(product_id, quantity, warehouse_id),
        )
        .await
        {
            Ok(check) => check,
            Err(_) => {
                warn!(product_id = %product_id, "stock validation timed out");
                StockCheck {
                    is_valid: false,
                    requested_quantity: quantity,
                    available_quantity: 0,
                    message: Some("Stock validation timed out".to_string()),
                }
            }
        }
    }

    fn record_validation_failure(&mut self, product_id: &ProductId, check: &StockCheck) {
        let message = check
            .message
            .clone()
            .unwrap_or_else(|| "Insufficient stock".to_string());
        self.validation_errors.insert(product_id.clone(), message);
    }

    /// Recompute totals then persist: the two halves of every mutation.
    fn commit(&mut self) -> Result<(), CommerceError> {
        self.state.recompute(self.calculator.config().tax_rate);
        self.persist()
    }

    fn persist(&self) -> Result<(), CommerceError> {
        set_json(self.storage.as_ref(), CART_STORAGE_KEY, &self.state)?;
        Ok(())
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart_id", &self.state.id)
            .field("items", &self.state.items.len())
            .finish()
    }
}
