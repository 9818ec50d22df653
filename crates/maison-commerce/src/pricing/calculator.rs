//! Unit price calculation with tier and volume discounts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{PriceListId, ProductId};
use crate::money::{Currency, Money};
use crate::pricing::list::{
    CustomerTier, PriceBook, VolumeDiscount, VolumeDiscountValue,
};

/// Calculator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax rate percent applied to HT prices (French TVA by default).
    pub tax_rate: f64,
    /// Currency all prices are computed in.
    pub currency: Currency,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: 20.0,
            currency: Currency::EUR,
        }
    }
}

/// Options for a single price calculation.
#[derive(Debug, Clone)]
pub struct PriceOptions {
    /// Whether volume discounts are considered (on by default).
    pub include_volume_discount: bool,
    /// Customer tier used to select the active price list.
    pub tier: CustomerTier,
}

impl Default for PriceOptions {
    fn default() -> Self {
        Self {
            include_volume_discount: true,
            tier: CustomerTier::Standard,
        }
    }
}

/// Result of a unit price calculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculatedPrice {
    /// Final tax-excluded unit price.
    pub unit_price_ht: Money,
    /// Final tax-included unit price, rounded independently.
    pub unit_price_ttc: Money,
    /// Currency of both amounts.
    pub currency: Currency,
    /// Tax rate percent used for the TTC derivation.
    pub tax_rate: f64,
    /// Undiscounted unit price. Present only when a discount applied.
    pub original_price_ht: Option<Money>,
    /// Combined discount percent, rounded to 1 decimal. Present only when a
    /// discount applied.
    pub discount_percent: Option<f64>,
    /// The volume tier that matched, if any.
    pub volume_discount: Option<VolumeDiscount>,
    /// The price list that produced the tier discount, if any.
    pub price_list_id: Option<PriceListId>,
}

/// Pure unit price calculator.
///
/// Never errors: negative inputs are clamped to zero rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct PriceCalculator {
    config: PricingConfig,
    price_book: PriceBook,
    volume_discounts: HashMap<ProductId, Vec<VolumeDiscount>>,
}

impl PriceCalculator {
    pub fn new(config: PricingConfig, price_book: PriceBook) -> Self {
        Self {
            config,
            price_book,
            volume_discounts: HashMap::new(),
        }
    }

    /// Register volume discount tiers for a product.
    pub fn set_volume_discounts(&mut self, product_id: ProductId, tiers: Vec<VolumeDiscount>) {
        self.volume_discounts.insert(product_id, tiers);
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Compute the unit price for a product at a quantity.
    ///
    /// Tier discount applies first; the matching volume tier then applies to
    /// the already-discounted price (multiplicative stacking). A fixed-unit-
    /// price tier overrides the computed price instead of stacking.
    pub fn calculate(
        &self,
        product_id: &ProductId,
        base_price: Money,
        quantity: i64,
        options: &PriceOptions,
    ) -> CalculatedPrice {
        let now = current_timestamp();
        self.calculate_at(product_id, base_price, quantity, options, now)
    }

    /// Same as [`calculate`](Self::calculate) with an explicit clock, for
    /// deterministic evaluation of promotional windows.
    pub fn calculate_at(
        &self,
        product_id: &ProductId,
        base_price: Money,
        quantity: i64,
        options: &PriceOptions,
        now: i64,
    ) -> CalculatedPrice {
        let base = base_price.clamp_non_negative();
        let quantity = quantity.max(1);

        let active = self.price_book.active_list(options.tier, now);
        let tier_percent = active
            .map(|l| l.discount_percent.clamp(0.0, 100.0))
            .filter(|p| *p > 0.0);

        let mut unit_ht = match tier_percent {
            Some(p) => base.multiply_decimal(1.0 - p / 100.0),
            None => base,
        };

        let mut volume_hit: Option<&VolumeDiscount> = None;
        let mut volume_percent: Option<f64> = None;

        if options.include_volume_discount && quantity > 1 {
            let tiers = self
                .volume_discounts
                .get(product_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if let Some(tier) = VolumeDiscount::applicable(tiers, quantity) {
                volume_hit = Some(tier);
                match &tier.value {
                    VolumeDiscountValue::FixedUnitPrice(fixed) => {
                        unit_ht = fixed.clamp_non_negative();
                    }
                    VolumeDiscountValue::Percent(p) => {
                        let p = p.clamp(0.0, 100.0);
                        unit_ht = unit_ht.multiply_decimal(1.0 - p / 100.0);
                        volume_percent = Some(p);
                    }
                }
            }
        }

        let discounted = unit_ht != base;
        let discount_percent = if discounted {
            Some(combined_percent(base, unit_ht, tier_percent, volume_percent))
        } else {
            None
        };

        CalculatedPrice {
            unit_price_ht: unit_ht,
            unit_price_ttc: unit_ht.with_tax(self.config.tax_rate),
            currency: self.config.currency,
            tax_rate: self.config.tax_rate,
            original_price_ht: discounted.then_some(base),
            discount_percent,
            volume_discount: volume_hit.cloned(),
            price_list_id: tier_percent
                .and(active)
                .map(|l| l.id.clone()),
        }
    }
}

/// Combined discount percent, rounded to 1 decimal.
///
/// When both discounts are percentages the stacking formula
/// `1 - (1-t)(1-v)` is exact; a fixed unit price falls back to the
/// effective ratio against the base price.
fn combined_percent(
    base: Money,
    unit: Money,
    tier_percent: Option<f64>,
    volume_percent: Option<f64>,
) -> f64 {
    let combined = match (tier_percent, volume_percent) {
        (Some(t), Some(v)) => 100.0 * (1.0 - (1.0 - t / 100.0) * (1.0 - v / 100.0)),
        (Some(t), None) => t,
        (None, Some(v)) => v,
        (None, None) => {
            if base.amount_cents <= 0 {
                0.0
            } else {
                100.0 * (1.0 - unit.amount_cents as f64 / base.amount_cents as f64)
            }
        }
    };
    (combined * 10.0).round() / 10.0
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::list::PriceList;

    fn calculator_with_tier(percent: f64) -> PriceCalculator {
        let mut book = PriceBook::default();
        book.push(PriceList::default_list("Catalogue"));
        book.push(PriceList::for_tier("Premium", CustomerTier::Premium, percent));
        PriceCalculator::new(PricingConfig::default(), book)
    }

    fn premium() -> PriceOptions {
        PriceOptions {
            tier: CustomerTier::Premium,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_discount_passthrough() {
        let calc = calculator_with_tier(10.0);
        let pid = ProductId::new("p1");
        let price = calc.calculate(
            &pid,
            Money::new(10000, Currency::EUR),
            1,
            &PriceOptions::default(),
        );
        assert_eq!(price.unit_price_ht.amount_cents, 10000);
        assert_eq!(price.unit_price_ttc.amount_cents, 12000);
        assert!(price.original_price_ht.is_none());
        assert!(price.discount_percent.is_none());
    }

    #[test]
    fn test_tier_discount_applies() {
        let calc = calculator_with_tier(10.0);
        let pid = ProductId::new("p1");
        let price = calc.calculate(&pid, Money::new(10000, Currency::EUR), 1, &premium());
        assert_eq!(price.unit_price_ht.amount_cents, 9000);
        assert_eq!(price.original_price_ht.unwrap().amount_cents, 10000);
        assert_eq!(price.discount_percent, Some(10.0));
        assert!(price.price_list_id.is_some());
    }

    #[test]
    fn test_multiplicative_stacking() {
        // 10% tier + 10% volume = 19% combined, not 20%.
        let mut calc = calculator_with_tier(10.0);
        let pid = ProductId::new("p1");
        calc.set_volume_discounts(pid.clone(), vec![VolumeDiscount::percent(5, 10.0, "5+")]);

        let price = calc.calculate(&pid, Money::new(10000, Currency::EUR), 5, &premium());
        assert_eq!(price.unit_price_ht.amount_cents, 8100);
        assert_eq!(price.discount_percent, Some(19.0));
    }

    #[test]
    fn test_volume_best_tier_only() {
        let mut calc = calculator_with_tier(0.0);
        let pid = ProductId::new("p1");
        calc.set_volume_discounts(
            pid.clone(),
            vec![
                VolumeDiscount::percent(5, 5.0, "5+"),
                VolumeDiscount::percent(10, 10.0, "10+"),
                VolumeDiscount::percent(25, 15.0, "25+"),
            ],
        );

        let price = calc.calculate(
            &pid,
            Money::new(10000, Currency::EUR),
            24,
            &PriceOptions::default(),
        );
        assert_eq!(price.unit_price_ht.amount_cents, 9000);
        assert_eq!(price.volume_discount.as_ref().unwrap().min_quantity, 10);
    }

    #[test]
    fn test_fixed_unit_price_overrides() {
        let mut calc = calculator_with_tier(10.0);
        let pid = ProductId::new("p1");
        calc.set_volume_discounts(
            pid.clone(),
            vec![VolumeDiscount::fixed(10, Money::new(7500, Currency::EUR), "bulk")],
        );

        let price = calc.calculate(&pid, Money::new(10000, Currency::EUR), 12, &premium());
        assert_eq!(price.unit_price_ht.amount_cents, 7500);
        // Effective percent against base, to 1 decimal.
        assert_eq!(price.discount_percent, Some(25.0));
    }

    #[test]
    fn test_volume_skipped_for_single_unit() {
        let mut calc = calculator_with_tier(0.0);
        let pid = ProductId::new("p1");
        calc.set_volume_discounts(pid.clone(), vec![VolumeDiscount::percent(1, 50.0, "1+")]);

        let price = calc.calculate(
            &pid,
            Money::new(10000, Currency::EUR),
            1,
            &PriceOptions::default(),
        );
        assert_eq!(price.unit_price_ht.amount_cents, 10000);
        assert!(price.volume_discount.is_none());
    }

    #[test]
    fn test_volume_opt_out() {
        let mut calc = calculator_with_tier(0.0);
        let pid = ProductId::new("p1");
        calc.set_volume_discounts(pid.clone(), vec![VolumeDiscount::percent(2, 10.0, "2+")]);

        let options = PriceOptions {
            include_volume_discount: false,
            ..Default::default()
        };
        let price = calc.calculate(&pid, Money::new(10000, Currency::EUR), 5, &options);
        assert_eq!(price.unit_price_ht.amount_cents, 10000);
    }

    #[test]
    fn test_negative_input_clamped() {
        let calc = calculator_with_tier(0.0);
        let pid = ProductId::new("p1");
        let price = calc.calculate(
            &pid,
            Money::new(-500, Currency::EUR),
            -3,
            &PriceOptions::default(),
        );
        assert_eq!(price.unit_price_ht.amount_cents, 0);
        assert_eq!(price.unit_price_ttc.amount_cents, 0);
    }

    #[test]
    fn test_promotional_window_selected_at_time() {
        let mut book = PriceBook::default();
        book.push(PriceList::default_list("Catalogue"));
        book.push(PriceList::promotional("Soldes", 30.0, 1_000, 2_000));
        let calc = PriceCalculator::new(PricingConfig::default(), book);
        let pid = ProductId::new("p1");

        let inside = calc.calculate_at(
            &pid,
            Money::new(10000, Currency::EUR),
            1,
            &PriceOptions::default(),
            1_500,
        );
        assert_eq!(inside.unit_price_ht.amount_cents, 7000);

        let outside = calc.calculate_at(
            &pid,
            Money::new(10000, Currency::EUR),
            1,
            &PriceOptions::default(),
            3_000,
        );
        assert_eq!(outside.unit_price_ht.amount_cents, 10000);
    }
}
