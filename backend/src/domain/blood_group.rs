//! ABO/Rh blood group label.
//!
//! Groups are compared as normalised labels. Unknown labels are accepted and
//! flow through matching untouched; rejecting them is the job of whoever owns
//! the input form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors for blood group labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BloodGroupValidationError {
    /// The label was blank once trimmed.
    #[error("blood group must not be empty")]
    Empty,
}

/// Normalised blood group label such as `A+` or `O-`.
///
/// ## Invariants
/// - Non-empty after trimming.
/// - Stored upper-cased so `o-` and `O-` name the same group.
///
/// # Examples
/// ```
/// use lifelink::domain::BloodGroup;
///
/// let group = BloodGroup::new(" ab+ ").expect("valid label");
/// assert_eq!(group.as_str(), "AB+");
/// assert!(!group.is_universal_donor());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BloodGroup(String);

/// Label of the universal red-cell donor group.
pub const UNIVERSAL_DONOR: &str = "O-";

const RECOGNISED_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

impl BloodGroup {
    /// Validate and normalise a blood group label.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BloodGroupValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BloodGroupValidationError::Empty);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The universal donor group, `O-`.
    #[must_use]
    pub fn universal_donor() -> Self {
        Self(UNIVERSAL_DONOR.to_owned())
    }

    /// Whether this is the universal donor group.
    #[must_use]
    pub fn is_universal_donor(&self) -> bool {
        self.0 == UNIVERSAL_DONOR
    }

    /// Whether the label is one of the eight ABO/Rh groups.
    #[must_use]
    pub fn is_recognised(&self) -> bool {
        RECOGNISED_GROUPS.contains(&self.0.as_str())
    }

    /// Borrow the normalised label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BloodGroup {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for BloodGroup {
    type Error = BloodGroupValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BloodGroup> for String {
    fn from(value: BloodGroup) -> Self {
        value.0
    }
}
