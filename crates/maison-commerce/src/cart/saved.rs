//! Named cart snapshots: list, load, share, delete.

use std::sync::Arc;

use maison_cache::{get_json, set_json, KvStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cart::state::{current_timestamp, CartItem, CartState};
use crate::error::CommerceError;
use crate::ids::SavedCartId;

/// Fixed storage key for the saved-cart list.
pub const SAVED_CARTS_STORAGE_KEY: &str = "maison:saved-carts";

/// An immutable-at-creation snapshot of a cart's items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedCart {
    pub id: SavedCartId,
    /// User-chosen name.
    pub name: String,
    /// Snapshot of the items at save time.
    pub items: Vec<CartItem>,
    /// Opaque URL-safe token for sharing.
    pub share_token: String,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl SavedCart {
    fn snapshot(name: impl Into<String>, state: &CartState) -> Self {
        Self {
            id: SavedCartId::generate(),
            name: name.into(),
            items: state.items.clone(),
            share_token: generate_share_token(),
            created_at: current_timestamp(),
        }
    }
}

/// Service over the persisted saved-cart list.
pub struct SavedCartStore {
    storage: Arc<dyn KvStore>,
}

impl SavedCartStore {
    pub fn new(storage: Arc<dyn KvStore>) -> Self {
        Self { storage }
    }

    /// Save the current cart's items under a name.
    pub fn save(&self, name: impl Into<String>, state: &CartState) -> Result<SavedCart, CommerceError> {
        let saved = SavedCart::snapshot(name, state);
        let mut all = self.list()?;
        all.push(saved.clone());
        self.persist(&all)?;
        Ok(saved)
    }

    /// All saved carts, newest last. Malformed persisted data is treated as
    /// an empty list.
    pub fn list(&self) -> Result<Vec<SavedCart>, CommerceError> {
        match get_json::<Vec<SavedCart>>(self.storage.as_ref(), SAVED_CARTS_STORAGE_KEY) {
            Ok(Some(all)) => Ok(all),
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                warn!(error = %e, "failed to parse saved carts, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Items of a saved cart, for loading into the current cart.
    pub fn load(&self, id: &SavedCartId) -> Result<Vec<CartItem>, CommerceError> {
        self.list()?
            .into_iter()
            .find(|c| c.id == *id)
            .map(|c| c.items)
            .ok_or_else(|| CommerceError::SavedCartNotFound(id.to_string()))
    }

    /// Resolve a share token to its snapshot.
    pub fn find_by_token(&self, token: &str) -> Result<Option<SavedCart>, CommerceError> {
        Ok(self.list()?.into_iter().find(|c| c.share_token == token))
    }

    /// Delete a saved cart. Deleting an absent id is a no-op.
    pub fn delete(&self, id: &SavedCartId) -> Result<(), CommerceError> {
        let mut all = self.list()?;
        all.retain(|c| c.id != *id);
        self.persist(&all)
    }

    fn persist(&self, all: &[SavedCart]) -> Result<(), CommerceError> {
        set_json(self.storage.as_ref(), SAVED_CARTS_STORAGE_KEY, &all)?;
        Ok(())
    }
}

/// Generate an opaque URL-safe share token.
fn generate_share_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 18] = rand::thread_rng().gen();
    format!("mc_{}", URL_SAFE_NO_PAD.encode(bytes))
}
