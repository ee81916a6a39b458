use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const SHOP_KEY: &str = "onething-shop";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopState {
    /// In purchase order; each id at most once.
    pub purchased_item_ids: Vec<String>,
}

/// Ownership record. Paying for an item is the ledger's concern.
pub struct ShopLedger {
    state: Persisted<ShopState>,
}

impl ShopLedger {
    pub fn new(backend: Arc<dyn StateStore>) -> Self {
        Self {
            state: Persisted::new(SHOP_KEY, backend),
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&ShopState> {
        self.state.get()
    }

    pub fn has_purchased(&self, item_id: &str) -> Result<bool> {
        Ok(self
            .state
            .get()?
            .purchased_item_ids
            .iter()
            .any(|id| id == item_id))
    }

    /// Returns `false` when the item is already owned.
    pub fn record_purchase(&mut self, item_id: &str) -> Result<bool> {
        if self.has_purchased(item_id)? {
            return Ok(false);
        }
        self.state
            .update(|s| s.purchased_item_ids.push(item_id.to_string()))?;
        debug!(item_id, "purchase recorded");
        Ok(true)
    }
}
