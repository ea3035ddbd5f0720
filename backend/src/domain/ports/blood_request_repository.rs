//! Port for the Request Ledger store.
//!
//! Writes go through [`BloodRequestRepository::commit`], which applies a
//! request update and any unit reservations as one atomic step guarded by a
//! status precondition. A lost reservation race or a concurrent status change
//! leaves the store untouched.

use async_trait::async_trait;

use crate::domain::{BloodGroup, BloodRequest, RequestId, RequestStatus, SmartId, UnitId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by request repository adapters.
    pub enum BloodRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "request repository query failed: {message}",
        /// No request with this identifier exists.
        NotFound { request_id: RequestId } => "request {request_id} not found",
        /// A request with this identifier already exists.
        AlreadyExists { request_id: RequestId } =>
            "request {request_id} already exists",
        /// The stored status no longer matches the write precondition.
        StaleStatus { request_id: RequestId, expected: RequestStatus, actual: RequestStatus } =>
            "request {request_id} is {actual}, expected {expected}",
        /// A unit selected for reservation was taken by another writer.
        ReservationConflict { unit_id: UnitId } =>
            "unit {unit_id} is no longer available",
    }
}

/// Condition the stored request must satisfy for a commit to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePrecondition {
    /// The request must not exist yet.
    Absent,
    /// The stored request must currently hold this status.
    Status(RequestStatus),
}

/// One atomic Request Ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWrite {
    /// Request state to store.
    pub request: BloodRequest,
    /// Condition checked before anything is written.
    pub precondition: WritePrecondition,
    /// Units to move `Available -> Reserved` for this request.
    pub reserve: Vec<UnitId>,
}

impl RequestWrite {
    /// Insert a brand new request without reserving stock.
    #[must_use]
    pub fn insert(request: BloodRequest) -> Self {
        Self {
            request,
            precondition: WritePrecondition::Absent,
            reserve: Vec::new(),
        }
    }

    /// Replace a stored request currently in `expected`.
    #[must_use]
    pub fn transition(request: BloodRequest, expected: RequestStatus) -> Self {
        Self {
            request,
            precondition: WritePrecondition::Status(expected),
            reserve: Vec::new(),
        }
    }

    /// Reserve `units` as part of the same write.
    #[must_use]
    pub fn reserving(mut self, units: Vec<UnitId>) -> Self {
        self.reserve = units;
        self
    }
}

/// Port for reading and writing blood requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestRepository: Send + Sync {
    /// Find a request by identifier.
    async fn find_by_id(
        &self,
        request_id: RequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError>;

    /// Requests raised by `requester`, newest first.
    async fn list_by_requester(
        &self,
        requester: &SmartId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Every request, newest first.
    async fn list_all(&self) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Pending requests whose broadcast list names `donor`, newest first.
    async fn list_broadcasts_for(
        &self,
        donor: &SmartId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Pending requests for `group`, oldest first.
    async fn list_pending_fifo(
        &self,
        group: &BloodGroup,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Apply `write` atomically.
    async fn commit(&self, write: RequestWrite) -> Result<(), BloodRequestRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn stale_status_reports_both_states() {
        let err = BloodRequestRepositoryError::stale_status(
            RequestId::random(),
            RequestStatus::Pending,
            RequestStatus::Approved,
        );
        let message = err.to_string();
        assert!(message.contains("is Approved"));
        assert!(message.contains("expected Pending"));
    }
}
