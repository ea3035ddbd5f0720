//! Driving port for member profile queries.
//!
//! Inbound adapters use this port to load the caller's profile without
//! importing persistence details.

use async_trait::async_trait;

use crate::domain::{Error, Member, SmartId};

/// Domain use-case port for reading a member's profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberProfileQuery: Send + Sync {
    /// Return the profile for `smart_id`.
    async fn fetch_profile(&self, smart_id: &SmartId) -> Result<Member, Error>;
}
