//! Members of the network: patients, donors and institutions.
//!
//! A member is identified by a *smart identifier*, either a ten digit phone
//! number or an institutional e-mail address. Role-specific attributes such as
//! the donor's blood group are optional on the record and validated here
//! rather than by shape-checking at runtime.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{BloodGroup, BloodGroupValidationError};

/// Validation errors for member attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemberValidationError {
    /// Smart identifier was blank.
    #[error("smart identifier must not be empty")]
    EmptySmartId,
    /// Smart identifier was neither a phone number nor an e-mail address.
    #[error("smart identifier must be a 10 digit phone number or an e-mail address")]
    MalformedSmartId,
    /// Display name was blank.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// Display name exceeded the maximum length.
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Role label was not recognised.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// Recorded blood group was invalid.
    #[error(transparent)]
    BloodGroup(#[from] BloodGroupValidationError),
}

static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^[0-9]{10}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("e-mail regex failed to compile: {error}"))
    })
}

/// Unique member identifier: a phone number or an e-mail address.
///
/// ## Invariants
/// - Phone numbers are exactly ten ASCII digits.
/// - E-mail addresses are trimmed and lower-cased.
///
/// # Examples
/// ```
/// use lifelink::domain::SmartId;
///
/// let email = SmartId::new(" Hospital@LifeLink.com ").expect("valid e-mail");
/// assert_eq!(email.as_ref(), "hospital@lifelink.com");
/// assert!(SmartId::new("9876543210").is_ok());
/// assert!(SmartId::new("12345").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SmartId(String);

impl SmartId {
    /// Validate and normalise a smart identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, MemberValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MemberValidationError::EmptySmartId);
        }
        if phone_regex().is_match(trimmed) {
            return Ok(Self(trimmed.to_owned()));
        }
        let lowered = trimmed.to_lowercase();
        if email_regex().is_match(&lowered) {
            return Ok(Self(lowered));
        }
        Err(MemberValidationError::MalformedSmartId)
    }
}

impl AsRef<str> for SmartId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SmartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SmartId {
    type Error = MemberValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SmartId> for String {
    fn from(value: SmartId) -> Self {
        value.0
    }
}

/// Maximum allowed length for a member display name.
pub const DISPLAY_NAME_MAX: usize = 120;

/// Full name of a person or institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a display name.
    pub fn new(raw: impl Into<String>) -> Result<Self, MemberValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MemberValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(MemberValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DisplayName {
    type Error = MemberValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

/// Role a member plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Person requesting blood for themselves.
    Patient,
    /// Person who may be asked to donate.
    Donor,
    /// Hospital raising requests and holding stock.
    Hospital,
    /// Clinic raising requests and holding stock.
    Clinic,
    /// Blood bank holding stock and approving requests.
    Bloodbank,
}

impl Role {
    /// Lower-case label as stored and serialised.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Donor => "donor",
            Self::Hospital => "hospital",
            Self::Clinic => "clinic",
            Self::Bloodbank => "bloodbank",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MemberValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Self::Patient),
            "donor" => Ok(Self::Donor),
            "hospital" => Ok(Self::Hospital),
            "clinic" => Ok(Self::Clinic),
            "bloodbank" => Ok(Self::Bloodbank),
            _ => Err(MemberValidationError::UnknownRole(s.to_owned())),
        }
    }
}

/// Registered member of the network.
///
/// Credentials are held by the identity provider, never on this record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Unique smart identifier.
    pub smart_id: SmartId,
    /// Full name shown to other members.
    pub display_name: DisplayName,
    /// Role in the network.
    pub role: Role,
    /// Blood group, recorded for donors and patients.
    pub blood_group: Option<BloodGroup>,
    /// End of a temporary donation deferral, if any.
    pub deferral_until: Option<DateTime<Utc>>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Whether the member is a donor with a recorded group in `groups`.
    #[must_use]
    pub fn donates_to_any(&self, groups: &[BloodGroup]) -> bool {
        self.role == Role::Donor
            && self
                .blood_group
                .as_ref()
                .is_some_and(|group| groups.contains(group))
    }
}
