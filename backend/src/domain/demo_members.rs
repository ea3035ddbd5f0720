//! Demo accounts used for local development and the in-memory store.
//!
//! Credentials live with the identity provider; the shared demo password is
//! only honoured by [`crate::domain::ports::FixtureLoginService`].

use chrono::{DateTime, Utc};

use super::{BloodGroup, DisplayName, Member, MemberValidationError, Role, SmartId};

/// Password accepted for every demo account.
pub const DEMO_PASSWORD: &str = "password123";

const DEMO_ACCOUNTS: [(&str, &str, Role, Option<&str>); 6] = [
    ("hospital@lifelink.com", "City General Hospital", Role::Hospital, None),
    ("clinic@lifelink.com", "Riverside Clinic", Role::Clinic, None),
    ("bloodbank@lifelink.com", "Central Blood Bank", Role::Bloodbank, None),
    ("patient@lifelink.com", "Priya Sharma", Role::Patient, Some("O+")),
    ("donor.onegative@lifelink.com", "Arjun Mehta", Role::Donor, Some("O-")),
    ("donor.apositive@lifelink.com", "Meera Iyer", Role::Donor, Some("A+")),
];

/// Build the demo member records, stamped with `created_at`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use lifelink::domain::{Role, demo_members};
///
/// let members = demo_members(Utc::now()).expect("demo records are valid");
/// assert!(members.iter().any(|member| member.role == Role::Bloodbank));
/// ```
pub fn demo_members(created_at: DateTime<Utc>) -> Result<Vec<Member>, MemberValidationError> {
    DEMO_ACCOUNTS
        .iter()
        .map(|(smart_id, name, role, group)| {
            Ok(Member {
                smart_id: SmartId::new(smart_id)?,
                display_name: DisplayName::new(*name)?,
                role: *role,
                blood_group: group.map(BloodGroup::new).transpose()?,
                deferral_until: None,
                created_at,
            })
        })
        .collect()
}
