//! Inventory Ledger entities: individual blood units and their lifecycle.
//!
//! Units move `Available -> Reserved`, or are taken out of circulation as
//! `Quarantined` or `Expired`. A unit is never reserved twice; the store
//! enforces this with a compare-and-set on the status column.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BloodGroup, RequestId};

/// Shelf life applied to every collected unit.
///
/// Whole blood stored in CPDA-1 keeps for 42 days. Component-specific windows
/// are not modelled.
pub const SHELF_LIFE_DAYS: i64 = 42;

/// Component recorded when the caller does not supply one.
pub const DEFAULT_COMPONENT: &str = "Whole Blood";

/// Upper bound on units accepted in a single stock addition.
pub const MAX_UNITS_PER_ADDITION: u32 = 100;

/// Store-assigned identifier of a unit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(Uuid);

impl UnitId {
    /// Mint a fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-facing tracking code printed on the bag label.
///
/// Generated in the ISBT-128 donation identification shape
/// `W#### ##### ##`. Uniqueness is enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Generate a random tracking code.
    ///
    /// # Examples
    /// ```
    /// use lifelink::domain::TrackingCode;
    ///
    /// let code = TrackingCode::generate(&mut rand::thread_rng());
    /// assert_eq!(code.as_str().len(), 14);
    /// assert!(code.as_str().starts_with('W'));
    /// ```
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let facility: u32 = rng.gen_range(1000..10_000);
        let sequence: u32 = rng.gen_range(10_000..100_000);
        let check: u32 = rng.gen_range(10..100);
        Self(format!("W{facility} {sequence} {check}"))
    }

    /// Wrap a previously issued code read back from storage.
    #[must_use]
    pub fn from_stored(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blood component label, e.g. `Whole Blood` or `Platelets`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(String);

impl ComponentType {
    /// Use `raw` when non-blank, otherwise [`DEFAULT_COMPONENT`].
    #[must_use]
    pub fn new_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(label) if !label.is_empty() => Self(label.to_owned()),
            _ => Self::default(),
        }
    }

    /// Borrow the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for ComponentType {
    fn default() -> Self {
        Self(DEFAULT_COMPONENT.to_owned())
    }
}

/// Lifecycle status of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// On the shelf and eligible for allocation.
    Available,
    /// Held for a specific approved request.
    Reserved,
    /// Withdrawn pending investigation.
    Quarantined,
    /// Past its expiry date.
    Expired,
}

impl UnitStatus {
    /// Label as stored and serialised.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Reserved => "Reserved",
            Self::Quarantined => "Quarantined",
            Self::Expired => "Expired",
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::Reserved | Self::Quarantined | Self::Expired)
        )
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit status: {0}")]
pub struct UnknownUnitStatus(pub String);

impl FromStr for UnitStatus {
    type Err = UnknownUnitStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(Self::Available),
            "Reserved" => Ok(Self::Reserved),
            "Quarantined" => Ok(Self::Quarantined),
            "Expired" => Ok(Self::Expired),
            other => Err(UnknownUnitStatus(other.to_owned())),
        }
    }
}

/// One discrete donation-derived blood product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodUnit {
    /// Store identifier.
    pub id: UnitId,
    /// Label tracking code, unique across the ledger.
    pub tracking_code: TrackingCode,
    /// Component type.
    pub component_type: ComponentType,
    /// Blood group of the unit.
    pub blood_group: BloodGroup,
    /// When the donation was collected.
    pub collection_date: DateTime<Utc>,
    /// Collection date plus [`SHELF_LIFE_DAYS`].
    pub expiry_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: UnitStatus,
    /// Name of the institution holding the unit.
    pub institution: String,
    /// Request this unit is held for once reserved.
    pub reserved_for: Option<RequestId>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Validated stock addition, before identifiers are minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAddition {
    /// Blood group of every added unit.
    pub blood_group: BloodGroup,
    /// Component type of every added unit.
    pub component_type: ComponentType,
    /// Number of units, `1..=MAX_UNITS_PER_ADDITION`.
    pub quantity: u32,
    /// Collection date; defaults to the current time.
    pub collection_date: Option<DateTime<Utc>>,
    /// Holding institution.
    pub institution: String,
}

impl StockAddition {
    /// Expand the addition into fresh `Available` units.
    ///
    /// `now` stamps creation and stands in for a missing collection date.
    pub fn into_units<R: Rng + ?Sized>(self, now: DateTime<Utc>, rng: &mut R) -> Vec<BloodUnit> {
        let collection_date = self.collection_date.unwrap_or(now);
        let expiry_date = collection_date + Duration::days(SHELF_LIFE_DAYS);
        (0..self.quantity)
            .map(|_| BloodUnit {
                id: UnitId::random(),
                tracking_code: TrackingCode::generate(rng),
                component_type: self.component_type.clone(),
                blood_group: self.blood_group.clone(),
                collection_date,
                expiry_date,
                status: UnitStatus::Available,
                institution: self.institution.clone(),
                reserved_for: None,
                created_at: now,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn addition(quantity: u32, collection_date: Option<DateTime<Utc>>) -> StockAddition {
        StockAddition {
            blood_group: BloodGroup::new("A+").expect("group"),
            component_type: ComponentType::default(),
            quantity,
            collection_date,
            institution: "City Blood Bank".to_owned(),
        }
    }

    #[rstest]
    fn units_default_collection_date_to_now(now: DateTime<Utc>) {
        let mut rng = SmallRng::seed_from_u64(7);
        let units = addition(3, None).into_units(now, &mut rng);

        assert_eq!(units.len(), 3);
        for unit in &units {
            assert_eq!(unit.collection_date, now);
            assert_eq!(unit.expiry_date, now + Duration::days(42));
            assert_eq!(unit.status, UnitStatus::Available);
            assert!(unit.reserved_for.is_none());
        }
    }

    #[rstest]
    fn expiry_follows_supplied_collection_date(now: DateTime<Utc>) {
        let collected = now - Duration::days(10);
        let mut rng = SmallRng::seed_from_u64(7);
        let units = addition(1, Some(collected)).into_units(now, &mut rng);

        let unit = units.first().expect("one unit");
        assert_eq!(unit.expiry_date, collected + Duration::days(SHELF_LIFE_DAYS));
        assert_eq!(unit.created_at, now);
    }

    #[rstest]
    fn tracking_codes_follow_isbt_shape() {
        let mut rng = SmallRng::seed_from_u64(42);
        let code = TrackingCode::generate(&mut rng);
        let parts: Vec<&str> = code.as_str().split(' ').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with('W'));
        assert_eq!(parts[0].len(), 5);
        assert_eq!(parts[1].len(), 5);
        assert_eq!(parts[2].len(), 2);
    }

    #[rstest]
    #[case(None, DEFAULT_COMPONENT)]
    #[case(Some("  "), DEFAULT_COMPONENT)]
    #[case(Some("Platelets"), "Platelets")]
    fn component_type_defaults_to_whole_blood(#[case] raw: Option<&str>, #[case] expected: &str) {
        assert_eq!(ComponentType::new_or_default(raw).as_str(), expected);
    }

    #[rstest]
    #[case(UnitStatus::Available, UnitStatus::Reserved, true)]
    #[case(UnitStatus::Available, UnitStatus::Expired, true)]
    #[case(UnitStatus::Reserved, UnitStatus::Reserved, false)]
    #[case(UnitStatus::Reserved, UnitStatus::Available, false)]
    #[case(UnitStatus::Expired, UnitStatus::Available, false)]
    fn status_transitions_are_one_way(
        #[case] from: UnitStatus,
        #[case] to: UnitStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn status_labels_round_trip() {
        for status in [
            UnitStatus::Available,
            UnitStatus::Reserved,
            UnitStatus::Quarantined,
            UnitStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<UnitStatus>(), Ok(status));
        }
    }
}
