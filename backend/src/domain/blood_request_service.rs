//! Allocation Engine and Request Ledger services.
//!
//! [`BloodRequestService`] implements the request driving ports. Creation and
//! manual approval go through the shared [`Allocator`]; the remaining actions
//! are plain status transitions committed with a status precondition so a
//! concurrent change is reported instead of overwritten.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    BloodRequestCommand, BloodRequestQuery, BloodRequestRepository, InventoryRepository,
    MemberRepository, RequestWrite, WritePrecondition,
};
use crate::domain::repository_errors::{
    map_member_error, map_request_error, map_transition_error,
};
use crate::domain::{
    AllocationOutcome, Allocator, BloodRequest, Error, Fulfiller, Member, NewBloodRequest,
    RequestId, RequestStatus, SmartId, compatible_donor_groups,
};

/// Request lifecycle service implementing command and query driving ports.
pub struct BloodRequestService<I, Q, M> {
    allocator: Allocator<I, Q>,
    members: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<I, Q, M> BloodRequestService<I, Q, M> {
    /// Create the service over an allocator and the member store.
    pub fn new(allocator: Allocator<I, Q>, members: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            allocator,
            members,
            clock,
        }
    }
}

impl<I, Q, M> BloodRequestService<I, Q, M>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
    M: MemberRepository,
{
    async fn load(&self, request_id: RequestId) -> Result<BloodRequest, Error> {
        self.allocator
            .requests()
            .find_by_id(request_id)
            .await
            .map_err(map_request_error)?
            .ok_or_else(|| {
                Error::not_found("Request not found").with_details(json!({ "requestId": request_id }))
            })
    }

    async fn member(&self, smart_id: &SmartId) -> Result<Member, Error> {
        self.members
            .find_by_smart_id(smart_id)
            .await
            .map_err(map_member_error)?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    async fn store(&self, write: RequestWrite) -> Result<BloodRequest, Error> {
        let request = write.request.clone();
        self.allocator
            .requests()
            .commit(write)
            .await
            .map_err(map_request_error)?;
        Ok(request)
    }

    /// Record the request as pending with every compatible donor notified.
    async fn broadcast(&self, request: BloodRequest) -> Result<BloodRequest, Error> {
        let groups = compatible_donor_groups(&request.blood_group);
        let donors = self
            .members
            .list_donors_in_groups(&groups)
            .await
            .map_err(map_member_error)?;
        let recipients = donors
            .into_iter()
            .filter(|donor| donor.donates_to_any(&groups))
            .map(|donor| donor.smart_id)
            .collect();
        let pending = request
            .broadcast(recipients)
            .map_err(|err| Error::internal(format!("new request rejected broadcast: {err}")))?;
        info!(
            request_id = %pending.id,
            blood_group = %pending.blood_group,
            recipients = pending.broadcast_to.len(),
            "request pending; broadcast recorded"
        );
        self.store(RequestWrite::insert(pending)).await
    }
}

#[async_trait]
impl<I, Q, M> BloodRequestCommand for BloodRequestService<I, Q, M>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
    M: MemberRepository,
{
    async fn create(&self, submission: NewBloodRequest) -> Result<BloodRequest, Error> {
        self.member(&submission.requester).await?;
        let request = BloodRequest::open(submission, RequestId::random(), self.clock.utc());
        match self
            .allocator
            .allocate(request, Fulfiller::Network, WritePrecondition::Absent)
            .await?
        {
            AllocationOutcome::Approved(approved) => Ok(approved),
            AllocationOutcome::Shortfall { request, .. } => self.broadcast(request).await,
        }
    }

    async fn approve(&self, request_id: RequestId) -> Result<BloodRequest, Error> {
        let request = self.load(request_id).await?;
        if request.status != RequestStatus::Pending {
            return Err(Error::invalid_state("Request already processed").with_details(json!({
                "requestId": request_id,
                "status": request.status.as_str(),
                "required": RequestStatus::Pending.as_str(),
            })));
        }
        let needed = request.units_needed.get();
        match self
            .allocator
            .allocate(
                request,
                Fulfiller::ManualApproval,
                WritePrecondition::Status(RequestStatus::Pending),
            )
            .await?
        {
            AllocationOutcome::Approved(approved) => Ok(approved),
            AllocationOutcome::Shortfall { available, .. } => Err(Error::insufficient_stock(
                "Insufficient stock to approve",
            )
            .with_details(json!({
                "requestId": request_id,
                "required": needed,
                "available": available,
            }))),
        }
    }

    async fn dispatch(&self, request_id: RequestId) -> Result<BloodRequest, Error> {
        let request = self.load(request_id).await?;
        let dispatched = request
            .dispatch()
            .map_err(|err| map_transition_error(&err, "Request must be Approved first"))?;
        self.store(RequestWrite::transition(dispatched, RequestStatus::Approved))
            .await
    }

    async fn donate(&self, request_id: RequestId, donor: &SmartId) -> Result<BloodRequest, Error> {
        let donor = self.member(donor).await?;
        let request = self.load(request_id).await?;
        let fulfilled = request
            .accept_donation(donor.display_name.as_ref())
            .map_err(|err| map_transition_error(&err, "Request no longer pending"))?;
        self.store(RequestWrite::transition(fulfilled, RequestStatus::Pending))
            .await
    }

    async fn cancel(
        &self,
        request_id: RequestId,
        caller: &SmartId,
    ) -> Result<BloodRequest, Error> {
        let request = self.load(request_id).await?;
        if &request.requester != caller {
            return Err(Error::forbidden("Only the requester can cancel this request")
                .with_details(json!({ "requestId": request_id })));
        }
        let cancelled = request
            .cancel()
            .map_err(|err| map_transition_error(&err, "Request no longer pending"))?;
        self.store(RequestWrite::transition(cancelled, RequestStatus::Pending))
            .await
    }
}

#[async_trait]
impl<I, Q, M> BloodRequestQuery for BloodRequestService<I, Q, M>
where
    I: InventoryRepository,
    Q: BloodRequestRepository,
    M: MemberRepository,
{
    async fn list_for_requester(&self, requester: &SmartId) -> Result<Vec<BloodRequest>, Error> {
        self.allocator
            .requests()
            .list_by_requester(requester)
            .await
            .map_err(map_request_error)
    }

    async fn list_all(&self) -> Result<Vec<BloodRequest>, Error> {
        self.allocator
            .requests()
            .list_all()
            .await
            .map_err(map_request_error)
    }

    async fn list_broadcasts(&self, donor: &SmartId) -> Result<Vec<BloodRequest>, Error> {
        self.allocator
            .requests()
            .list_broadcasts_for(donor)
            .await
            .map_err(map_request_error)
    }
}

#[cfg(test)]
#[path = "blood_request_service_tests.rs"]
mod tests;
