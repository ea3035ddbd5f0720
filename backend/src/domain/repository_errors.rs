//! Translation of driven-port failures into transport-agnostic [`Error`]s.

use serde_json::json;

use crate::domain::ports::{
    BloodRequestRepositoryError, InventoryRepositoryError, MemberRepositoryError,
};
use crate::domain::{Error, RequestTransitionError};

pub(crate) fn map_inventory_error(error: InventoryRepositoryError) -> Error {
    match error {
        InventoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("inventory store unavailable: {message}"))
        }
        InventoryRepositoryError::Query { message } => {
            Error::internal(format!("inventory store error: {message}"))
        }
        InventoryRepositoryError::NotFound { unit_id } => {
            Error::not_found("Unit not found").with_details(json!({ "unitId": unit_id }))
        }
        InventoryRepositoryError::ReservationConflict { unit_id } => {
            Error::conflict(format!("unit {unit_id} is no longer available"))
                .with_details(json!({ "unitId": unit_id }))
        }
        InventoryRepositoryError::DuplicateTrackingCode { code } => {
            Error::conflict(format!("tracking code {code} has already been issued"))
        }
    }
}

pub(crate) fn map_request_error(error: BloodRequestRepositoryError) -> Error {
    match error {
        BloodRequestRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("request store unavailable: {message}"))
        }
        BloodRequestRepositoryError::Query { message } => {
            Error::internal(format!("request store error: {message}"))
        }
        BloodRequestRepositoryError::NotFound { request_id } => {
            Error::not_found("Request not found").with_details(json!({ "requestId": request_id }))
        }
        BloodRequestRepositoryError::AlreadyExists { request_id } => {
            Error::conflict(format!("request {request_id} already exists"))
                .with_details(json!({ "requestId": request_id }))
        }
        BloodRequestRepositoryError::StaleStatus {
            request_id,
            expected,
            actual,
        } => Error::invalid_state(format!("request {request_id} is {actual}")).with_details(
            json!({
                "requestId": request_id,
                "status": actual.as_str(),
                "required": expected.as_str(),
            }),
        ),
        BloodRequestRepositoryError::ReservationConflict { unit_id } => {
            Error::conflict(format!("unit {unit_id} is no longer available"))
                .with_details(json!({ "unitId": unit_id }))
        }
    }
}

pub(crate) fn map_member_error(error: MemberRepositoryError) -> Error {
    match error {
        MemberRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("member store unavailable: {message}"))
        }
        MemberRepositoryError::Query { message } => {
            Error::internal(format!("member store error: {message}"))
        }
    }
}

/// Map a lifecycle violation to `invalid_state`, using `message` as the
/// caller-facing text.
pub(crate) fn map_transition_error(error: &RequestTransitionError, message: &str) -> Error {
    Error::invalid_state(message).with_details(json!({
        "requestId": error.request_id,
        "status": error.status.as_str(),
        "required": error.action.required_status().as_str(),
    }))
}
