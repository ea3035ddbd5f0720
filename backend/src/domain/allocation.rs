//! Shared conditional reservation primitive.
//!
//! Request creation, manual approval and back-in-stock reconciliation all
//! funnel through [`Allocator::allocate`]. It selects `Available` units,
//! then commits the approved request and the reservation as one write guarded
//! by a status precondition. A lost race on any unit rolls the whole write
//! back; the allocator then reselects against fresh availability, up to a
//! bounded number of attempts.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, InventoryRepository, RequestWrite,
    WritePrecondition,
};
use crate::domain::repository_errors::{
    map_inventory_error, map_request_error, map_transition_error,
};
use crate::domain::{BloodRequest, Error, Fulfiller};

/// Reservation attempts made before a conflict is surfaced to the caller.
pub const DEFAULT_RESERVATION_ATTEMPTS: usize = 3;

/// Result of one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// Units were reserved and the approved request stored.
    Approved(BloodRequest),
    /// Not enough stock; nothing was written.
    Shortfall {
        /// The request, unchanged.
        request: BloodRequest,
        /// `Available` units of the group found at selection time.
        available: usize,
    },
}

/// Conditional reservation engine shared by every approval path.
pub struct Allocator<I, Q> {
    inventory: Arc<I>,
    requests: Arc<Q>,
    max_attempts: usize,
}

impl<I, Q> Clone for Allocator<I, Q> {
    fn clone(&self) -> Self {
        Self {
            inventory: Arc::clone(&self.inventory),
            requests: Arc::clone(&self.requests),
            max_attempts: self.max_attempts,
        }
    }
}

impl<I, Q> Allocator<I, Q> {
    /// Create an allocator retrying at most `max_attempts` times.
    ///
    /// A budget of zero is treated as one attempt.
    pub fn new(inventory: Arc<I>, requests: Arc<Q>, max_attempts: usize) -> Self {
        Self {
            inventory,
            requests,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attempt budget in effect.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Inventory store the allocator selects from.
    #[must_use]
    pub fn inventory(&self) -> &Arc<I> {
        &self.inventory
    }

    /// Request store the allocator commits to.
    #[must_use]
    pub fn requests(&self) -> &Arc<Q> {
        &self.requests
    }
}

impl<I, Q> Allocator<I, Q>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
{
    /// Reserve `request.units_needed` units of the request's group and store
    /// the request as `Approved` by `fulfiller`.
    ///
    /// `precondition` guards the stored request: [`WritePrecondition::Absent`]
    /// for a brand new request, [`WritePrecondition::Status`] when approving a
    /// stored pending one. Returns [`AllocationOutcome::Shortfall`] without
    /// writing anything when stock is short.
    ///
    /// # Errors
    ///
    /// `conflict` when every attempt lost its reservation race,
    /// `invalid_state` when the stored request changed status underneath us,
    /// and the mapped store error otherwise.
    pub async fn allocate(
        &self,
        request: BloodRequest,
        fulfiller: Fulfiller,
        precondition: WritePrecondition,
    ) -> Result<AllocationOutcome, Error> {
        let needed = request.units_needed_len();
        for attempt in 1..=self.max_attempts {
            let units = self
                .inventory
                .take_available(&request.blood_group, needed)
                .await
                .map_err(map_inventory_error)?;
            if units.len() < needed {
                debug!(
                    request_id = %request.id,
                    blood_group = %request.blood_group,
                    needed,
                    available = units.len(),
                    "insufficient stock for allocation"
                );
                return Ok(AllocationOutcome::Shortfall {
                    request,
                    available: units.len(),
                });
            }

            let approved = request
                .clone()
                .approve(fulfiller.clone())
                .map_err(|err| map_transition_error(&err, "Request already processed"))?;
            let unit_ids = units.iter().map(|unit| unit.id).collect();
            let write = match precondition {
                WritePrecondition::Absent => RequestWrite::insert(approved.clone()),
                WritePrecondition::Status(expected) => {
                    RequestWrite::transition(approved.clone(), expected)
                }
            }
            .reserving(unit_ids);

            match self.requests.commit(write).await {
                Ok(()) => {
                    info!(
                        request_id = %approved.id,
                        blood_group = %approved.blood_group,
                        units = needed,
                        fulfiller = %fulfiller,
                        attempt,
                        "request approved"
                    );
                    return Ok(AllocationOutcome::Approved(approved));
                }
                Err(BloodRequestRepositoryError::ReservationConflict { unit_id }) => {
                    debug!(
                        request_id = %request.id,
                        %unit_id,
                        attempt,
                        "lost reservation race; reselecting units"
                    );
                }
                Err(other) => return Err(map_request_error(other)),
            }
        }

        Err(
            Error::conflict("Inventory changed concurrently; please retry").with_details(json!({
                "requestId": request.id,
                "attempts": self.max_attempts,
            })),
        )
    }
}

#[cfg(test)]
#[path = "allocation_tests.rs"]
mod tests;
