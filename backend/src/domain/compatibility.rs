//! Donor compatibility rules used when a request has to be broadcast.

use super::BloodGroup;

/// Return the donor groups eligible to satisfy a request for `requested`.
///
/// The exact group always qualifies and the universal donor group `O-` is
/// appended unless it is the requested group itself. Labels outside the eight
/// ABO/Rh groups pass through as a singleton of themselves.
///
/// # Examples
/// ```
/// use lifelink::domain::{BloodGroup, compatible_donor_groups};
///
/// let ab_pos = BloodGroup::new("AB+").expect("label");
/// let groups = compatible_donor_groups(&ab_pos);
/// let labels: Vec<&str> = groups.iter().map(BloodGroup::as_str).collect();
/// assert_eq!(labels, ["AB+", "O-"]);
/// ```
#[must_use]
pub fn compatible_donor_groups(requested: &BloodGroup) -> Vec<BloodGroup> {
    let mut groups = vec![requested.clone()];
    if requested.is_recognised() && !requested.is_universal_donor() {
        groups.push(BloodGroup::universal_donor());
    }
    groups
}
