//! Back-in-stock reconciliation.
//!
//! After stock of a group is added, pending requests for that group are
//! revisited strictly oldest first. Each one that current availability can
//! cover in full is approved through the shared [`Allocator`]; requests it
//! cannot cover are left pending and the scan moves on, so a later request is
//! never partially served ahead of an earlier one.

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ports::{BloodRequestRepository, InventoryRepository, WritePrecondition};
use crate::domain::repository_errors::{map_inventory_error, map_request_error};
use crate::domain::{
    AllocationOutcome, Allocator, BloodGroup, Error, ErrorCode, Fulfiller, RequestId,
    RequestStatus,
};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    /// Requests approved during the pass, in approval order.
    pub approved: Vec<RequestId>,
    /// Pending requests left untouched.
    pub still_pending: usize,
}

/// Re-evaluates pending demand after new supply arrives.
pub struct Reconciler<I, Q> {
    allocator: Allocator<I, Q>,
}

impl<I, Q> Clone for Reconciler<I, Q> {
    fn clone(&self) -> Self {
        Self {
            allocator: self.allocator.clone(),
        }
    }
}

impl<I, Q> Reconciler<I, Q> {
    /// Create a reconciler sharing `allocator`'s stores and retry budget.
    pub fn new(allocator: Allocator<I, Q>) -> Self {
        Self { allocator }
    }
}

impl<I, Q> Reconciler<I, Q>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
{
    /// Approve every pending request for `group` that stock now covers.
    ///
    /// Requests changed concurrently by another writer are skipped.
    pub async fn reconcile(&self, group: &BloodGroup) -> Result<ReconciliationSummary, Error> {
        let pending = self
            .allocator
            .requests()
            .list_pending_fifo(group)
            .await
            .map_err(map_request_error)?;
        let mut summary = ReconciliationSummary::default();

        for request in pending {
            let needed = request.units_needed_len();
            let available = self
                .allocator
                .inventory()
                .count_available(group)
                .await
                .map_err(map_inventory_error)?;
            if available < needed {
                debug!(
                    request_id = %request.id,
                    needed,
                    available,
                    "pending request still short of stock"
                );
                summary.still_pending += 1;
                continue;
            }

            let request_id = request.id;
            match self
                .allocator
                .allocate(
                    request,
                    Fulfiller::AutoAllocation,
                    WritePrecondition::Status(RequestStatus::Pending),
                )
                .await
            {
                Ok(AllocationOutcome::Approved(approved)) => summary.approved.push(approved.id),
                Ok(AllocationOutcome::Shortfall { .. }) => summary.still_pending += 1,
                Err(error) if error.code() == ErrorCode::InvalidState => {
                    debug!(%request_id, "request changed during reconciliation; skipping");
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            blood_group = %group,
            approved = summary.approved.len(),
            still_pending = summary.still_pending,
            "back-in-stock reconciliation complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{
        BloodRequestRepositoryError, MockBloodRequestRepository, MockInventoryRepository,
    };
    use crate::domain::service_test_helpers::{available_units, group, pending_request};

    fn reconciler(
        inventory: MockInventoryRepository,
        requests: MockBloodRequestRepository,
    ) -> Reconciler<MockInventoryRepository, MockBloodRequestRepository> {
        Reconciler::new(Allocator::new(Arc::new(inventory), Arc::new(requests), 3))
    }

    #[rstest]
    #[tokio::test]
    async fn skips_requests_stock_cannot_cover_and_continues_in_order() {
        let first = pending_request("A+", 5, 0);
        let second = pending_request("A+", 2, 1);
        let second_id = second.id;

        let mut requests = MockBloodRequestRepository::new();
        requests
            .expect_list_pending_fifo()
            .times(1)
            .return_once(move |_| Ok(vec![first, second]));
        requests
            .expect_commit()
            .withf(move |write| write.request.id == second_id)
            .times(1)
            .return_once(|_| Ok(()));
        let mut inventory = MockInventoryRepository::new();
        inventory.expect_count_available().times(2).returning(|_| Ok(4));
        inventory
            .expect_take_available()
            .times(1)
            .return_once(|_, _| Ok(available_units("A+", 2)));

        let summary = reconciler(inventory, requests)
            .reconcile(&group("A+"))
            .await
            .expect("reconciliation succeeds");

        assert_eq!(summary.approved, vec![second_id]);
        assert_eq!(summary.still_pending, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrently_processed_requests_are_skipped() {
        let stale = pending_request("O-", 1, 0);
        let stale_id = stale.id;

        let mut requests = MockBloodRequestRepository::new();
        requests
            .expect_list_pending_fifo()
            .return_once(move |_| Ok(vec![stale]));
        requests.expect_commit().times(1).return_once(move |_| {
            Err(BloodRequestRepositoryError::stale_status(
                stale_id,
                RequestStatus::Pending,
                RequestStatus::Cancelled,
            ))
        });
        let mut inventory = MockInventoryRepository::new();
        inventory.expect_count_available().returning(|_| Ok(1));
        inventory
            .expect_take_available()
            .return_once(|_, _| Ok(available_units("O-", 1)));

        let summary = reconciler(inventory, requests)
            .reconcile(&group("O-"))
            .await
            .expect("stale requests are not fatal");

        assert!(summary.approved.is_empty());
        assert_eq!(summary.still_pending, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_propagate() {
        let mut requests = MockBloodRequestRepository::new();
        requests
            .expect_list_pending_fifo()
            .return_once(|_| Err(BloodRequestRepositoryError::connection("refused")));

        let error = reconciler(MockInventoryRepository::new(), requests)
            .reconcile(&group("B+"))
            .await
            .expect_err("store down");

        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
