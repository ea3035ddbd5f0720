//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed entities for the blood allocation core and
//! the services that drive them through the ports in [`ports`]. Types are
//! validated at construction; serialisation contracts are documented on each
//! type.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - BloodUnit / BloodRequest: Inventory and Request Ledger records.
//! - Allocator: the shared conditional reservation primitive.
//! - BloodRequestService / InventoryService: driving port implementations.

pub mod allocation;
pub mod auth;
pub mod blood_group;
pub mod blood_request;
pub mod blood_request_service;
pub mod compatibility;
pub mod demo_members;
pub mod error;
pub mod inventory;
pub mod inventory_service;
pub mod member;
pub mod member_profile_service;
pub mod ports;
pub mod reconciler;
pub(crate) mod repository_errors;
#[cfg(test)]
pub(crate) mod service_test_helpers;
pub mod trace_id;

pub use self::allocation::{AllocationOutcome, Allocator, DEFAULT_RESERVATION_ATTEMPTS};
pub use self::auth::{CallerIdentity, LoginCredentials, LoginValidationError};
pub use self::blood_group::{BloodGroup, BloodGroupValidationError, UNIVERSAL_DONOR};
pub use self::blood_request::{
    BloodRequest, Fulfiller, NewBloodRequest, RequestAction, RequestId, RequestStatus,
    RequestTransitionError, UnknownLabel, Urgency,
};
pub use self::blood_request_service::BloodRequestService;
pub use self::compatibility::compatible_donor_groups;
pub use self::demo_members::{DEMO_PASSWORD, demo_members};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::inventory::{
    BloodUnit, ComponentType, DEFAULT_COMPONENT, MAX_UNITS_PER_ADDITION, SHELF_LIFE_DAYS,
    StockAddition, TrackingCode, UnitId, UnitStatus, UnknownUnitStatus,
};
pub use self::inventory_service::InventoryService;
pub use self::member::{
    DISPLAY_NAME_MAX, DisplayName, Member, MemberValidationError, Role, SmartId,
};
pub use self::member_profile_service::MemberProfileService;
pub use self::reconciler::{ReconciliationSummary, Reconciler};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use lifelink::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
