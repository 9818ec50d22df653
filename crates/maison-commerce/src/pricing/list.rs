//! Price lists and volume discount tiers.

use crate::ids::PriceListId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Customer pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    #[default]
    Standard,
    Premium,
    Vip,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Standard => "standard",
            CustomerTier::Premium => "premium",
            CustomerTier::Vip => "vip",
        }
    }
}

/// A pricing policy: a global discount percentage with a priority and an
/// optional validity window (for promotional lists) or tier affinity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceList {
    /// Unique price list identifier.
    pub id: PriceListId,
    /// Display name.
    pub name: String,
    /// Global discount percent (0.0 - 100.0).
    pub discount_percent: f64,
    /// Selection priority among candidates; higher wins.
    pub priority: i32,
    /// Validity window start (Unix seconds). Promotional lists only.
    pub starts_at: Option<i64>,
    /// Validity window end (Unix seconds). Promotional lists only.
    pub ends_at: Option<i64>,
    /// Tier this list applies to. None means it is tier-agnostic.
    pub tier: Option<CustomerTier>,
    /// Whether this is the fallback list when nothing else matches.
    pub is_default: bool,
}

impl PriceList {
    /// Create the default (fallback) list with no discount.
    pub fn default_list(name: impl Into<String>) -> Self {
        Self {
            id: PriceListId::generate(),
            name: name.into(),
            discount_percent: 0.0,
            priority: 0,
            starts_at: None,
            ends_at: None,
            tier: None,
            is_default: true,
        }
    }

    /// Create a tier-affiliated list.
    pub fn for_tier(name: impl Into<String>, tier: CustomerTier, percent: f64) -> Self {
        Self {
            id: PriceListId::generate(),
            name: name.into(),
            discount_percent: percent,
            priority: 10,
            starts_at: None,
            ends_at: None,
            tier: Some(tier),
            is_default: false,
        }
    }

    /// Create a promotional list valid within a window.
    pub fn promotional(
        name: impl Into<String>,
        percent: f64,
        starts_at: i64,
        ends_at: i64,
    ) -> Self {
        Self {
            id: PriceListId::generate(),
            name: name.into(),
            discount_percent: percent,
            priority: 100,
            starts_at: Some(starts_at),
            ends_at: Some(ends_at),
            tier: None,
            is_default: false,
        }
    }

    /// Whether this list is a promotional one (carries a validity window).
    pub fn is_promotional(&self) -> bool {
        self.starts_at.is_some() || self.ends_at.is_some()
    }

    /// Check time-based validity at `now` (Unix seconds).
    pub fn is_valid_at(&self, now: i64) -> bool {
        if let Some(starts) = self.starts_at {
            if now < starts {
                return false;
            }
        }
        if let Some(ends) = self.ends_at {
            if now > ends {
                return false;
            }
        }
        true
    }
}

/// The set of price lists known to the calculator.
///
/// Exactly one list is active for a given customer at a given time:
/// a valid promotional list wins over a tier-matching list, which wins over
/// the default list. Ties are broken by `priority`, highest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceBook {
    lists: Vec<PriceList>,
}

impl PriceBook {
    pub fn new(lists: Vec<PriceList>) -> Self {
        Self { lists }
    }

    /// Add a list.
    pub fn push(&mut self, list: PriceList) {
        self.lists.push(list);
    }

    /// Select the active list for a customer tier at `now`.
    pub fn active_list(&self, tier: CustomerTier, now: i64) -> Option<&PriceList> {
        fn best(candidates: Vec<&PriceList>) -> Option<&PriceList> {
            candidates
                .into_iter()
                .max_by_key(|l| l.priority)
        }

        let promos: Vec<&PriceList> = self
            .lists
            .iter()
            .filter(|l| l.is_promotional() && l.is_valid_at(now))
            .collect();
        if let Some(list) = best(promos) {
            return Some(list);
        }

        let tiered: Vec<&PriceList> = self
            .lists
            .iter()
            .filter(|l| l.tier == Some(tier))
            .collect();
        if let Some(list) = best(tiered) {
            return Some(list);
        }

        self.lists.iter().find(|l| l.is_default)
    }
}

/// Value of a volume discount tier: a percent off, or a fixed unit price
/// that overrides the computed one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum VolumeDiscountValue {
    Percent(f64),
    FixedUnitPrice(Money),
}

/// A quantity-threshold discount tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeDiscount {
    /// Minimum quantity for this tier to apply.
    pub min_quantity: i64,
    /// Discount value.
    pub value: VolumeDiscountValue,
    /// Display label (e.g., "10+ pieces").
    pub label: String,
}

impl VolumeDiscount {
    pub fn percent(min_quantity: i64, percent: f64, label: impl Into<String>) -> Self {
        Self {
            min_quantity,
            value: VolumeDiscountValue::Percent(percent),
            label: label.into(),
        }
    }

    pub fn fixed(min_quantity: i64, unit_price: Money, label: impl Into<String>) -> Self {
        Self {
            min_quantity,
            value: VolumeDiscountValue::FixedUnitPrice(unit_price),
            label: label.into(),
        }
    }

    /// Pick the applicable tier for a quantity: the one with the highest
    /// `min_quantity` not exceeding it. Tiers are not cumulative.
    pub fn applicable(tiers: &[VolumeDiscount], quantity: i64) -> Option<&VolumeDiscount> {
        tiers
            .iter()
            .filter(|t| t.min_quantity <= quantity)
            .max_by_key(|t| t.min_quantity)
    }
}
