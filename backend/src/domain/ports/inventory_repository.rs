//! Port for the Inventory Ledger store.
//!
//! Adapters own the unit records. Reservation is a compare-and-set: a unit
//! moves `Available -> Reserved` only if it is still `Available` at the moment
//! of the write, and a batch either reserves every unit or none.

use async_trait::async_trait;

use crate::domain::{BloodGroup, BloodUnit, RequestId, UnitId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by inventory repository adapters.
    pub enum InventoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "inventory repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "inventory repository query failed: {message}",
        /// The unit does not exist.
        NotFound { unit_id: UnitId } => "unit {unit_id} not found",
        /// The unit was no longer `Available` when the reservation was written.
        ReservationConflict { unit_id: UnitId } =>
            "unit {unit_id} is no longer available",
        /// A tracking code collided with one already issued.
        DuplicateTrackingCode { code: String } =>
            "tracking code {code} has already been issued",
    }
}

/// Port for reading and mutating blood unit records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Durably record freshly created units.
    ///
    /// Either every unit is recorded or none is.
    async fn add_units(&self, units: &[BloodUnit]) -> Result<(), InventoryRepositoryError>;

    /// Every unit in the ledger, oldest first.
    async fn list_units(&self) -> Result<Vec<BloodUnit>, InventoryRepositoryError>;

    /// Count `Available` units of `group`.
    async fn count_available(&self, group: &BloodGroup) -> Result<usize, InventoryRepositoryError>;

    /// Up to `limit` `Available` units of `group`, oldest collection first.
    async fn take_available(
        &self,
        group: &BloodGroup,
        limit: usize,
    ) -> Result<Vec<BloodUnit>, InventoryRepositoryError>;

    /// Reserve every unit in `unit_ids` for `request_id`, or none of them.
    ///
    /// Standalone compare-and-set over the unit ledger: a unit moves to
    /// `Reserved` only while it is still `Available`, and no replacement
    /// units are selected. Approvals do not call this; they reserve through
    /// [`BloodRequestRepository::commit`](super::BloodRequestRepository::commit)
    /// so the status change and the reservation land in one write.
    ///
    /// # Errors
    ///
    /// `ReservationConflict` naming the first unit that was not `Available`,
    /// or `NotFound` for an unknown unit.
    async fn reserve(
        &self,
        unit_ids: &[UnitId],
        request_id: RequestId,
    ) -> Result<(), InventoryRepositoryError>;

    /// Delete a unit record.
    async fn remove(&self, unit_id: UnitId) -> Result<(), InventoryRepositoryError>;
}
