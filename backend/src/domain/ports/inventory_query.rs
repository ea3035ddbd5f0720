//! Driving port for Inventory Ledger reads.

use async_trait::async_trait;

use crate::domain::{BloodUnit, Error};

/// Driving port for listing stock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryQuery: Send + Sync {
    /// Every unit in the ledger, oldest first.
    async fn list_units(&self) -> Result<Vec<BloodUnit>, Error>;
}
