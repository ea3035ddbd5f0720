//! Driving port for login/authentication use-cases.
//!
//! In hexagonal terms this is a *driving* port: inbound adapters call it to
//! authenticate credentials without knowing (or importing) the backing
//! identity provider. HTTP handler tests substitute a test double instead of
//! wiring one.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    CallerIdentity, DEMO_PASSWORD, Error, LoginCredentials, SmartId, demo_members,
};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the verified caller.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<CallerIdentity, Error>;
}

/// Authenticator for the bundled demo accounts.
///
/// Every demo member signs in with [`DEMO_PASSWORD`]; anything else is
/// rejected as unauthorised.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<CallerIdentity, Error> {
        let invalid = || Error::unauthorized("Invalid credentials");
        let smart_id = SmartId::new(credentials.smart_id()).map_err(|_| invalid())?;
        if credentials.password() != DEMO_PASSWORD {
            return Err(invalid());
        }
        let members = demo_members(Utc::now())
            .map_err(|err| Error::internal(format!("invalid demo member: {err}")))?;
        members
            .into_iter()
            .find(|member| member.smart_id == smart_id)
            .map(|member| CallerIdentity {
                smart_id: member.smart_id,
                role: member.role,
            })
            .ok_or_else(invalid)
    }
}
