//! Port for member lookups used as requester and donor references.

use async_trait::async_trait;

use crate::domain::{BloodGroup, Member, SmartId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by member repository adapters.
    pub enum MemberRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "member repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "member repository query failed: {message}",
    }
}

/// Port for reading and seeding member records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find a member by smart identifier.
    async fn find_by_smart_id(
        &self,
        smart_id: &SmartId,
    ) -> Result<Option<Member>, MemberRepositoryError>;

    /// Donors whose recorded blood group is one of `groups`.
    async fn list_donors_in_groups(
        &self,
        groups: &[BloodGroup],
    ) -> Result<Vec<Member>, MemberRepositoryError>;

    /// Insert or replace a member record keyed by smart identifier.
    async fn upsert(&self, member: &Member) -> Result<(), MemberRepositoryError>;
}
