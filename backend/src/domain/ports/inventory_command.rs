//! Driving port for Inventory Ledger mutations.
//!
//! Adding stock triggers back-in-stock reconciliation for the added group
//! before the call returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BloodGroup, BloodUnit, ComponentType, Error, SmartId, UnitId};

/// Request to add units to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddUnitsRequest {
    /// Member recording the stock; their display name becomes the institution.
    pub caller: SmartId,
    /// Blood group of every unit.
    pub blood_group: BloodGroup,
    /// Component type of every unit.
    pub component_type: ComponentType,
    /// Number of units to create.
    pub quantity: u32,
    /// Collection date; defaults to now.
    pub collection_date: Option<DateTime<Utc>>,
}

/// Units created by an addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddUnitsResponse {
    /// Created units as recorded, before reconciliation reserved any of them.
    pub units: Vec<BloodUnit>,
}

/// Driving port for adding and removing stock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryCommand: Send + Sync {
    /// Create units, then reconcile pending requests for the group.
    async fn add_units(&self, request: AddUnitsRequest) -> Result<AddUnitsResponse, Error>;

    /// Administratively delete a unit.
    async fn remove_unit(&self, unit_id: UnitId) -> Result<(), Error>;
}
