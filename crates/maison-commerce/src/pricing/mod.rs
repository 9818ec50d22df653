//! Pricing engine: price lists, volume discounts, unit price calculation.

mod calculator;
mod list;

pub use calculator::{CalculatedPrice, PriceCalculator, PriceOptions, PricingConfig};
pub use list::{CustomerTier, PriceBook, PriceList, VolumeDiscount, VolumeDiscountValue};
