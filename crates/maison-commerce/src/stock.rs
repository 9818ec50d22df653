//! Stock validation: an asynchronous boundary to the inventory collaborator.
//!
//! Validation is a pure read; it never mutates cart state. Callers decide
//! whether to proceed from the returned [`StockCheck`]. In production the
//! implementation fronts `POST /api/stock/validate`; the in-memory
//! implementation here backs tests and the demo environment.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, WarehouseId};

/// Stock availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    #[default]
    Unknown,
}

/// Outcome of one stock check. `is_valid` is strictly
/// `requested_quantity <= available_quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockCheck {
    pub is_valid: bool,
    pub requested_quantity: i64,
    pub available_quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StockCheck {
    pub fn ok(requested: i64, available: i64) -> Self {
        Self {
            is_valid: true,
            requested_quantity: requested,
            available_quantity: available,
            message: None,
        }
    }

    pub fn insufficient(requested: i64, available: i64) -> Self {
        Self {
            is_valid: false,
            requested_quantity: requested,
            available_quantity: available,
            message: Some(format!(
                "Requested {} but only {} available",
                requested, available
            )),
        }
    }

    /// Status implied by the availability numbers.
    pub fn status(&self) -> StockStatus {
        if self.available_quantity <= 0 {
            StockStatus::OutOfStock
        } else if self.available_quantity < self.requested_quantity {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Inventory check request for the bulk form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<WarehouseId>,
}

/// Asynchronous inventory collaborator.
#[async_trait]
pub trait StockValidator: Send + Sync {
    /// Check one product's requested quantity against available inventory.
    async fn validate(
        &self,
        product_id: &ProductId,
        quantity: i64,
        warehouse_id: Option<&WarehouseId>,
    ) -> StockCheck;

    /// Bulk check; the default implementation checks items sequentially.
    async fn validate_many(&self, requests: &[StockRequest]) -> Vec<StockCheck> {
        let mut results = Vec::with_capacity(requests.len());
        for req in requests {
            results.push(
                self.validate(&req.product_id, req.quantity, req.warehouse_id.as_ref())
                    .await,
            );
        }
        results
    }
}

/// In-memory inventory with optional simulated latency.
#[derive(Debug, Default)]
pub struct InMemoryStockValidator {
    levels: Mutex<HashMap<ProductId, i64>>,
    latency: Option<Duration>,
}

impl InMemoryStockValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a network round trip on every check.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set the available quantity for a product.
    pub fn set_level(&self, product_id: ProductId, available: i64) {
        if let Ok(mut levels) = self.levels.lock() {
            levels.insert(product_id, available);
        }
    }
}

#[async_trait]
impl StockValidator for InMemoryStockValidator {
    async fn validate(
        &self,
        product_id: &ProductId,
        quantity: i64,
        _warehouse_id: Option<&WarehouseId>,
    ) -> StockCheck {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let available = self
            .levels
            .lock()
            .ok()
            .and_then(|levels| levels.get(product_id).copied())
            .unwrap_or(0);

        if quantity <= available {
            StockCheck::ok(quantity, available)
        } else {
            StockCheck::insufficient(quantity, available)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_within_stock() {
        let validator = InMemoryStockValidator::new();
        validator.set_level(ProductId::new("p1"), 10);

        let check = validator.validate(&ProductId::new("p1"), 10, None).await;
        assert!(check.is_valid);
        assert_eq!(check.available_quantity, 10);
        assert_eq!(check.status(), StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_validate_exceeding_stock() {
        let validator = InMemoryStockValidator::new();
        validator.set_level(ProductId::new("p1"), 3);

        let check = validator.validate(&ProductId::new("p1"), 5, None).await;
        assert!(!check.is_valid);
        assert_eq!(check.status(), StockStatus::LowStock);
        assert!(check.message.is_some());
    }

    #[tokio::test]
    async fn test_unknown_product_has_no_stock() {
        let validator = InMemoryStockValidator::new();
        let check = validator.validate(&ProductId::new("ghost"), 1, None).await;
        assert!(!check.is_valid);
        assert_eq!(check.status(), StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_bulk_validation() {
        let validator = InMemoryStockValidator::new();
        validator.set_level(ProductId::new("p1"), 5);
        validator.set_level(ProductId::new("p2"), 0);

        let checks = validator
            .validate_many(&[
                StockRequest {
                    product_id: ProductId::new("p1"),
                    quantity: 2,
                    warehouse_id: None,
                },
                StockRequest {
                    product_id: ProductId::new("p2"),
                    quantity: 1,
                    warehouse_id: None,
                },
            ])
            .await;

        assert!(checks[0].is_valid);
        assert!(!checks[1].is_valid);
    }
}
