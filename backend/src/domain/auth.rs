//! Authentication primitives: login credentials and the verified caller.
//!
//! Credential checking is delegated to the identity provider behind
//! [`crate::domain::ports::LoginService`]. The allocation core only ever sees
//! the resulting [`CallerIdentity`] and trusts it.

use std::fmt;

use zeroize::Zeroizing;

use super::{Role, SmartId};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Smart identifier was missing or blank once trimmed.
    EmptySmartId,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySmartId => write!(f, "smartId must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// The smart identifier is trimmed; the password is kept verbatim and wiped
/// from memory on drop.
///
/// # Examples
/// ```
/// use lifelink::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" patient@lifelink.com ", "password123")
///     .expect("non-empty parts");
/// assert_eq!(creds.smart_id(), "patient@lifelink.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    smart_id: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(smart_id: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = smart_id.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptySmartId);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            smart_id: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Smart identifier as typed by the caller, trimmed.
    pub fn smart_id(&self) -> &str {
        self.smart_id.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Verified subject and role supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Smart identifier of the authenticated member.
    pub smart_id: SmartId,
    /// Role embedded in the issued session.
    pub role: Role,
}
