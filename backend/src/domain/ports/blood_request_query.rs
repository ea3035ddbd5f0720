//! Driving port for Request Ledger listings.

use async_trait::async_trait;

use crate::domain::{BloodRequest, Error, SmartId};

/// Driving port for read-only request listings, newest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestQuery: Send + Sync {
    /// Requests raised by `requester`.
    async fn list_for_requester(&self, requester: &SmartId) -> Result<Vec<BloodRequest>, Error>;

    /// Every request.
    async fn list_all(&self) -> Result<Vec<BloodRequest>, Error>;

    /// Pending requests broadcast to `donor`.
    async fn list_broadcasts(&self, donor: &SmartId) -> Result<Vec<BloodRequest>, Error>;
}
