//! Driving port for Request Ledger mutations.
//!
//! Every action names the request it targets and fails with an error carrying
//! the request identifier and the status it was found in when the lifecycle
//! does not permit it.

use async_trait::async_trait;

use crate::domain::{BloodRequest, Error, NewBloodRequest, RequestId, SmartId};

/// Driving port for the request lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestCommand: Send + Sync {
    /// Submit a request and run it through allocation.
    ///
    /// The returned request is `Approved` when stock sufficed, otherwise
    /// `Pending` with its broadcast list recorded.
    async fn create(&self, submission: NewBloodRequest) -> Result<BloodRequest, Error>;

    /// Approve a pending request by hand, reserving stock.
    async fn approve(&self, request_id: RequestId) -> Result<BloodRequest, Error>;

    /// Dispatch an approved request.
    async fn dispatch(&self, request_id: RequestId) -> Result<BloodRequest, Error>;

    /// Record `donor` accepting a pending request.
    async fn donate(&self, request_id: RequestId, donor: &SmartId) -> Result<BloodRequest, Error>;

    /// Withdraw a pending request on behalf of its requester.
    async fn cancel(&self, request_id: RequestId, caller: &SmartId)
    -> Result<BloodRequest, Error>;
}
