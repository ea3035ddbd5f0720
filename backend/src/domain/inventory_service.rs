//! Inventory Ledger service.
//!
//! Implements the inventory driving ports. Every successful addition runs one
//! back-in-stock reconciliation pass for the added group once the units are
//! durably recorded; a failing pass is logged and does not undo the addition.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::ports::{
    AddUnitsRequest, AddUnitsResponse, BloodRequestRepository, InventoryCommand,
    InventoryQuery, InventoryRepository, InventoryRepositoryError, MemberRepository,
};
use crate::domain::repository_errors::{map_inventory_error, map_member_error};
use crate::domain::{
    BloodUnit, Error, MAX_UNITS_PER_ADDITION, Reconciler, StockAddition, UnitId,
};

/// Times a batch is regenerated after a tracking code collision.
const TRACKING_CODE_ATTEMPTS: usize = 3;

/// Stock service implementing inventory command and query driving ports.
pub struct InventoryService<I, Q, M> {
    inventory: Arc<I>,
    members: Arc<M>,
    reconciler: Reconciler<I, Q>,
    clock: Arc<dyn Clock>,
}

impl<I, Q, M> InventoryService<I, Q, M> {
    /// Create the service; `reconciler` must share `inventory`.
    pub fn new(
        inventory: Arc<I>,
        members: Arc<M>,
        reconciler: Reconciler<I, Q>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inventory,
            members,
            reconciler,
            clock,
        }
    }
}

impl<I, Q, M> InventoryService<I, Q, M>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
    M: MemberRepository,
{
    async fn record(&self, addition: StockAddition) -> Result<Vec<BloodUnit>, Error> {
        let now = self.clock.utc();
        for attempt in 1..=TRACKING_CODE_ATTEMPTS {
            let units = {
                let mut rng = rand::thread_rng();
                addition.clone().into_units(now, &mut rng)
            };
            match self.inventory.add_units(&units).await {
                Ok(()) => return Ok(units),
                Err(InventoryRepositoryError::DuplicateTrackingCode { code }) => {
                    warn!(%code, attempt, "tracking code collision; regenerating batch");
                }
                Err(other) => return Err(map_inventory_error(other)),
            }
        }
        Err(Error::conflict("Could not issue unique tracking codes; please retry"))
    }
}

#[async_trait]
impl<I, Q, M> InventoryCommand for InventoryService<I, Q, M>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
    M: MemberRepository,
{
    async fn add_units(&self, request: AddUnitsRequest) -> Result<AddUnitsResponse, Error> {
        if !(1..=MAX_UNITS_PER_ADDITION).contains(&request.quantity) {
            return Err(Error::invalid_request(format!(
                "quantity must be between 1 and {MAX_UNITS_PER_ADDITION}"
            ))
            .with_details(json!({ "field": "quantity", "value": request.quantity })));
        }
        let holder = self
            .members
            .find_by_smart_id(&request.caller)
            .await
            .map_err(map_member_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let blood_group = request.blood_group.clone();
        let units = self
            .record(StockAddition {
                blood_group: request.blood_group,
                component_type: request.component_type,
                quantity: request.quantity,
                collection_date: request.collection_date,
                institution: holder.display_name.to_string(),
            })
            .await?;
        info!(
            blood_group = %blood_group,
            quantity = units.len(),
            institution = %holder.display_name,
            "stock added"
        );

        if let Err(err) = self.reconciler.reconcile(&blood_group).await {
            error!(
                blood_group = %blood_group,
                error = %err,
                "back-in-stock reconciliation failed after stock was recorded"
            );
        }

        Ok(AddUnitsResponse { units })
    }

    async fn remove_unit(&self, unit_id: UnitId) -> Result<(), Error> {
        self.inventory
            .remove(unit_id)
            .await
            .map_err(map_inventory_error)?;
        info!(%unit_id, "unit removed");
        Ok(())
    }
}

#[async_trait]
impl<I, Q, M> InventoryQuery for InventoryService<I, Q, M>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
    M: MemberRepository,
{
    async fn list_units(&self) -> Result<Vec<BloodUnit>, Error> {
        self.inventory
            .list_units()
            .await
            .map_err(map_inventory_error)
    }
}

#[cfg(test)]
#[path = "inventory_service_tests.rs"]
mod tests;
