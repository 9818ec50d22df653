//! Promo code validation.
//!
//! Validation is a result value, never an error: an unknown code yields
//! `None` and the caller decides how to surface it. Production fronts
//! `POST /api/promo/validate`; the static table backs tests and the demo.

use std::collections::HashMap;

use async_trait::async_trait;

/// Asynchronous promo code collaborator.
#[async_trait]
pub trait PromoService: Send + Sync {
    /// Validate a code case-insensitively, returning its discount percent.
    async fn validate_code(&self, code: &str) -> Option<f64>;
}

/// Static code table.
#[derive(Debug, Clone)]
pub struct StaticPromoTable {
    codes: HashMap<String, f64>,
}

impl StaticPromoTable {
    pub fn new(codes: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            codes: codes
                .into_iter()
                .map(|(code, percent)| (code.to_uppercase(), percent))
                .collect(),
        }
    }
}

impl Default for StaticPromoTable {
    fn default() -> Self {
        Self::new([
            ("BIENVENUE10".to_string(), 10.0),
            ("PRO20".to_string(), 20.0),
            ("VIP30".to_string(), 30.0),
        ])
    }
}

#[async_trait]
impl PromoService for StaticPromoTable {
    async fn validate_code(&self, code: &str) -> Option<f64> {
        self.codes.get(&code.to_uppercase()).copied()
    }
}
