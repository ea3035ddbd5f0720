//! Diesel table definitions for the LifeLink PostgreSQL schema.
//!
//! Kept in step with `backend/migrations` by hand; `diesel print-schema`
//! against a migrated database regenerates them.

diesel::table! {
    /// Registered members keyed by smart identifier.
    members (smart_id) {
        /// Email address or phone number.
        smart_id -> Varchar,
        display_name -> Varchar,
        /// Lower-case role label.
        role -> Varchar,
        blood_group -> Nullable<Varchar>,
        deferral_until -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Inventory Ledger: one row per blood unit.
    ///
    /// `tracking_code` is unique. `reserved_for` is set exactly when the
    /// status is `Reserved`.
    blood_units (id) {
        id -> Uuid,
        tracking_code -> Varchar,
        component_type -> Varchar,
        blood_group -> Varchar,
        collection_date -> Timestamptz,
        expiry_date -> Timestamptz,
        status -> Varchar,
        institution -> Varchar,
        reserved_for -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    /// Request Ledger: one row per blood request.
    blood_requests (id) {
        id -> Uuid,
        requester -> Varchar,
        blood_group -> Varchar,
        units_needed -> Int4,
        hospital_name -> Nullable<Varchar>,
        urgency -> Varchar,
        status -> Varchar,
        /// Display label of whoever satisfied the request.
        fulfilled_by -> Nullable<Varchar>,
        /// Smart identifiers of donors notified about the request.
        broadcast_to -> Array<Text>,
        created_at -> Timestamptz,
        /// Insertion order; breaks ties between equal `created_at` values.
        seq -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(members, blood_units, blood_requests);
