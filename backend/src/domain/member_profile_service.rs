//! Member profile service backing `GET /auth/me`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{MemberProfileQuery, MemberRepository};
use crate::domain::repository_errors::map_member_error;
use crate::domain::{Error, Member, SmartId};

/// Profile lookups over the member store.
#[derive(Clone)]
pub struct MemberProfileService<M> {
    members: Arc<M>,
}

impl<M> MemberProfileService<M> {
    /// Create a new profile service.
    pub fn new(members: Arc<M>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl<M> MemberProfileQuery for MemberProfileService<M>
where
    M: MemberRepository,
{
    async fn fetch_profile(&self, smart_id: &SmartId) -> Result<Member, Error> {
        self.members
            .find_by_smart_id(smart_id)
            .await
            .map_err(map_member_error)?
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MemberRepositoryError, MockMemberRepository};
    use crate::domain::service_test_helpers::smart_id;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn missing_member_is_not_found() {
        let mut members = MockMemberRepository::new();
        members
            .expect_find_by_smart_id()
            .return_once(|_| Ok(None));

        let error = MemberProfileService::new(Arc::new(members))
            .fetch_profile(&smart_id("patient@lifelink.com"))
            .await
            .expect_err("missing member");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_are_service_unavailable() {
        let mut members = MockMemberRepository::new();
        members
            .expect_find_by_smart_id()
            .return_once(|_| Err(MemberRepositoryError::connection("refused")));

        let error = MemberProfileService::new(Arc::new(members))
            .fetch_profile(&smart_id("patient@lifelink.com"))
            .await
            .expect_err("store down");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
