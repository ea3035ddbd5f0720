//! Builders shared by the domain service tests.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    BloodGroup, BloodRequest, BloodUnit, ComponentType, DisplayName, Member, NewBloodRequest,
    RequestId, Role, SmartId, TrackingCode, UnitId, UnitStatus, Urgency,
};

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock pinned to [`epoch`].
pub(crate) struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        epoch().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        epoch()
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock)
}

pub(crate) fn group(label: &str) -> BloodGroup {
    BloodGroup::new(label).expect("fixture blood group")
}

pub(crate) fn smart_id(raw: &str) -> SmartId {
    SmartId::new(raw).expect("fixture smart id")
}

pub(crate) fn submission(requester: &str, label: &str, units: u32) -> NewBloodRequest {
    NewBloodRequest {
        requester: smart_id(requester),
        blood_group: group(label),
        units_needed: NonZeroU32::new(units).expect("non-zero units"),
        hospital_name: None,
        urgency: Urgency::Standard,
    }
}

/// Pending request created `offset_minutes` after [`epoch`].
pub(crate) fn pending_request(label: &str, units: u32, offset_minutes: i64) -> BloodRequest {
    BloodRequest::open(
        submission("hospital@lifelink.com", label, units),
        RequestId::random(),
        epoch() + Duration::minutes(offset_minutes),
    )
}

pub(crate) fn available_units(label: &str, count: usize) -> Vec<BloodUnit> {
    (0..count)
        .map(|index| BloodUnit {
            id: UnitId::random(),
            tracking_code: TrackingCode::from_stored(format!("W1000 {:05} 10", 10_000 + index)),
            component_type: ComponentType::default(),
            blood_group: group(label),
            collection_date: epoch(),
            expiry_date: epoch() + Duration::days(42),
            status: UnitStatus::Available,
            institution: "Central Blood Bank".to_owned(),
            reserved_for: None,
            created_at: epoch(),
        })
        .collect()
}

pub(crate) fn member(raw_id: &str, name: &str, role: Role, label: Option<&str>) -> Member {
    Member {
        smart_id: smart_id(raw_id),
        display_name: DisplayName::new(name).expect("fixture display name"),
        role,
        blood_group: label.map(group),
        deferral_until: None,
        created_at: epoch(),
    }
}
