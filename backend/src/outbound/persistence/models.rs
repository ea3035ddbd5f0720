//! Diesel row structs for the LifeLink tables.
//!
//! These types never leave the persistence layer; repositories convert them to
//! and from domain records.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{blood_requests, blood_units, members};

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Row read from the members table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MemberRow {
    pub smart_id: String,
    pub display_name: String,
    pub role: String,
    pub blood_group: Option<String>,
    pub deferral_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable member record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = members)]
pub(crate) struct NewMemberRow<'a> {
    pub smart_id: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub blood_group: Option<&'a str>,
    pub deferral_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Blood units
// ---------------------------------------------------------------------------

/// Row read from the blood_units table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blood_units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BloodUnitRow {
    pub id: Uuid,
    pub tracking_code: String,
    pub component_type: String,
    pub blood_group: String,
    pub collection_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: String,
    pub institution: String,
    pub reserved_for: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insertable blood unit record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blood_units)]
pub(crate) struct NewBloodUnitRow<'a> {
    pub id: Uuid,
    pub tracking_code: &'a str,
    pub component_type: &'a str,
    pub blood_group: &'a str,
    pub collection_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: &'a str,
    pub institution: &'a str,
    pub reserved_for: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Blood requests
// ---------------------------------------------------------------------------

/// Row read from the blood_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blood_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BloodRequestRow {
    pub id: Uuid,
    pub requester: String,
    pub blood_group: String,
    pub units_needed: i32,
    pub hospital_name: Option<String>,
    pub urgency: String,
    pub status: String,
    pub fulfilled_by: Option<String>,
    pub broadcast_to: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable blood request record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blood_requests)]
pub(crate) struct NewBloodRequestRow<'a> {
    pub id: Uuid,
    pub requester: &'a str,
    pub blood_group: &'a str,
    pub units_needed: i32,
    pub hospital_name: Option<&'a str>,
    pub urgency: &'a str,
    pub status: &'a str,
    pub fulfilled_by: Option<String>,
    pub broadcast_to: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Mutable columns written when a request changes status.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = blood_requests)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BloodRequestUpdate<'a> {
    pub status: &'a str,
    pub fulfilled_by: Option<String>,
    pub broadcast_to: Vec<String>,
}
