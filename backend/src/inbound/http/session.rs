//! Session helpers keeping handlers free of cookie plumbing.
//!
//! The session cookie carries the caller's smart identifier and role as
//! supplied by the identity provider at login. Handlers trust it and never
//! re-verify credentials.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use std::str::FromStr;
use tracing::warn;

use crate::domain::{CallerIdentity, Error, Role, SmartId};

pub(crate) const SMART_ID_KEY: &str = "smart_id";
pub(crate) const ROLE_KEY: &str = "role";

/// Newtype wrapper that exposes caller-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the verified caller in the session cookie.
    pub fn persist_caller(&self, caller: &CallerIdentity) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(SMART_ID_KEY, caller.smart_id.as_ref())
            .and_then(|()| self.0.insert(ROLE_KEY, caller.role.as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The caller recorded in the session, if any.
    ///
    /// A cookie whose values no longer parse is treated as absent.
    pub fn caller(&self) -> Result<Option<CallerIdentity>, Error> {
        let read = |key: &str| {
            self.0
                .get::<String>(key)
                .map_err(|error| Error::internal(format!("failed to read session: {error}")))
        };
        let (Some(raw_id), Some(raw_role)) = (read(SMART_ID_KEY)?, read(ROLE_KEY)?) else {
            return Ok(None);
        };
        match (SmartId::new(&raw_id), Role::from_str(&raw_role)) {
            (Ok(smart_id), Ok(role)) => Ok(Some(CallerIdentity { smart_id, role })),
            (Err(error), _) | (_, Err(error)) => {
                warn!(%error, "discarding malformed session cookie");
                Ok(None)
            }
        }
    }

    /// Require a caller or return `401 Unauthorized`.
    pub fn require_caller(&self) -> Result<CallerIdentity, Error> {
        self.caller()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
