//! Request Ledger HTTP handlers.
//!
//! ```text
//! POST /api/v1/requests/create {"bloodGroup":"AB+","units":2,"urgency":"Critical"}
//! GET  /api/v1/requests/my-requests
//! GET  /api/v1/requests/all
//! GET  /api/v1/requests/broadcasts
//! POST /api/v1/requests/{id}/fulfill
//! POST /api/v1/requests/{id}/dispatch
//! POST /api/v1/requests/{id}/donate
//! POST /api/v1/requests/{id}/cancel
//! ```

use std::num::NonZeroU32;
use std::str::FromStr;

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    BloodGroup, BloodRequest, NewBloodRequest, RequestId, RequestStatus, SmartId, Urgency,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, blank_field_error, invalid_value_error, out_of_range_error, parse_uuid,
    require_in_range,
};

/// Request submission payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    #[schema(example = "AB+")]
    pub blood_group: String,
    #[schema(minimum = 1, example = 2)]
    pub units: i64,
    #[schema(example = "City General Hospital")]
    pub hospital: Option<String>,
    /// `Standard`, `Urgent` or `Critical`, any case. Defaults to `Standard`.
    #[schema(example = "Urgent")]
    pub urgency: Option<String>,
}

/// Outcome of a request submission.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestResponseBody {
    #[schema(example = "Blood request processed")]
    pub message: String,
    /// `Approved` when stock was reserved, otherwise `Pending`.
    #[schema(example = "Pending")]
    pub status: String,
    #[schema(format = "uuid")]
    pub request_id: String,
    /// Number of donors notified; zero once approved.
    pub broadcast_count: usize,
}

/// One request as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequestBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "patient@lifelink.com")]
    pub requester: String,
    #[schema(example = "O+")]
    pub blood_group: String,
    pub units_needed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    #[schema(example = "Standard")]
    pub urgency: String,
    #[schema(example = "Approved")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "LifeLink Network")]
    pub fulfilled_by: Option<String>,
    pub broadcast_to: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BloodRequest> for BloodRequestBody {
    fn from(request: BloodRequest) -> Self {
        Self {
            id: request.id.to_string(),
            requester: request.requester.into(),
            blood_group: request.blood_group.into(),
            units_needed: request.units_needed.get(),
            hospital_name: request.hospital_name,
            urgency: request.urgency.as_str().to_owned(),
            status: request.status.as_str().to_owned(),
            fulfilled_by: request.fulfilled_by.map(|fulfiller| fulfiller.to_string()),
            broadcast_to: request.broadcast_to.into_iter().map(String::from).collect(),
            created_at: request.created_at,
        }
    }
}

/// Result of a lifecycle action.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestActionResponseBody {
    #[schema(example = "Blood Units Dispatched")]
    pub message: String,
    pub request: BloodRequestBody,
}

impl RequestActionResponseBody {
    fn new(message: &str, request: BloodRequest) -> Self {
        Self {
            message: message.to_owned(),
            request: request.into(),
        }
    }
}

fn parse_submission(body: CreateRequestBody, requester: SmartId) -> ApiResult<NewBloodRequest> {
    const BLOOD_GROUP: FieldName = FieldName::new("bloodGroup");
    const UNITS: FieldName = FieldName::new("units");
    const URGENCY: FieldName = FieldName::new("urgency");

    let blood_group =
        BloodGroup::new(&body.blood_group).map_err(|_| blank_field_error(BLOOD_GROUP))?;
    // Upper bound is the widest count the request store persists.
    let max_units = i64::from(i32::MAX);
    let units_needed = NonZeroU32::new(require_in_range(body.units, 1, max_units, UNITS)?)
        .ok_or_else(|| out_of_range_error(UNITS, body.units, 1, max_units))?;
    let urgency = match body.urgency.as_deref() {
        None => Urgency::default(),
        Some(raw) => {
            Urgency::from_str(raw).map_err(|err| invalid_value_error(URGENCY, raw, err))?
        }
    };
    let hospital_name = body
        .hospital
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());

    Ok(NewBloodRequest {
        requester,
        blood_group,
        units_needed,
        hospital_name,
        urgency,
    })
}

fn request_id(raw: String) -> ApiResult<RequestId> {
    parse_uuid(&raw, FieldName::new("id")).map(RequestId::from_uuid)
}

fn listing(requests: Vec<BloodRequest>) -> web::Json<Vec<BloodRequestBody>> {
    web::Json(requests.into_iter().map(BloodRequestBody::from).collect())
}

/// Submit a request and allocate stock or broadcast to donors.
#[utoipa::path(
    post,
    path = "/api/v1/requests/create",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request recorded", body = CreateRequestResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Caller is not a member", body = ErrorSchema),
        (status = 409, description = "Reservation retries exhausted", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "createRequest",
    security(("SessionCookie" = []))
)]
#[post("/requests/create")]
pub async fn create_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRequestBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let submission = parse_submission(payload.into_inner(), caller.smart_id)?;
    let request = state.requests.create(submission).await?;
    let broadcast_count = match request.status {
        RequestStatus::Pending => request.broadcast_to.len(),
        _ => 0,
    };
    Ok(HttpResponse::Created().json(CreateRequestResponseBody {
        message: "Blood request processed".to_owned(),
        status: request.status.as_str().to_owned(),
        request_id: request.id.to_string(),
        broadcast_count,
    }))
}

/// Requests raised by the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/requests/my-requests",
    responses(
        (status = 200, description = "Caller's requests", body = [BloodRequestBody]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "listMyRequests",
    security(("SessionCookie" = []))
)]
#[get("/requests/my-requests")]
pub async fn list_my_requests(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BloodRequestBody>>> {
    let caller = session.require_caller()?;
    let requests = state
        .requests_query
        .list_for_requester(&caller.smart_id)
        .await?;
    Ok(listing(requests))
}

/// Every request in the ledger, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/requests/all",
    responses(
        (status = 200, description = "All requests", body = [BloodRequestBody]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "listAllRequests",
    security(("SessionCookie" = []))
)]
#[get("/requests/all")]
pub async fn list_all_requests(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BloodRequestBody>>> {
    session.require_caller()?;
    let requests = state.requests_query.list_all().await?;
    Ok(listing(requests))
}

/// Pending requests broadcast to the calling donor, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/requests/broadcasts",
    responses(
        (status = 200, description = "Donor inbox", body = [BloodRequestBody]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "listBroadcasts",
    security(("SessionCookie" = []))
)]
#[get("/requests/broadcasts")]
pub async fn list_broadcasts(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BloodRequestBody>>> {
    let caller = session.require_caller()?;
    let requests = state
        .requests_query
        .list_broadcasts(&caller.smart_id)
        .await?;
    Ok(listing(requests))
}

/// Approve a pending request by hand, reserving stock.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/fulfill",
    params(("id" = String, Path, format = "uuid", description = "Request identifier")),
    responses(
        (status = 200, description = "Request approved", body = RequestActionResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Request not found", body = ErrorSchema),
        (status = 409, description = "Not pending or insufficient stock", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "fulfillRequest",
    security(("SessionCookie" = []))
)]
#[post("/requests/{id}/fulfill")]
pub async fn fulfill_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestActionResponseBody>> {
    session.require_caller()?;
    let approved = state.requests.approve(request_id(path.into_inner())?).await?;
    Ok(web::Json(RequestActionResponseBody::new(
        "Request Approved Manually",
        approved,
    )))
}

/// Mark an approved request's units as dispatched.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/dispatch",
    params(("id" = String, Path, format = "uuid", description = "Request identifier")),
    responses(
        (status = 200, description = "Units dispatched", body = RequestActionResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Request not found", body = ErrorSchema),
        (status = 409, description = "Request is not approved", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "dispatchRequest",
    security(("SessionCookie" = []))
)]
#[post("/requests/{id}/dispatch")]
pub async fn dispatch_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestActionResponseBody>> {
    session.require_caller()?;
    let dispatched = state.requests.dispatch(request_id(path.into_inner())?).await?;
    Ok(web::Json(RequestActionResponseBody::new(
        "Blood Units Dispatched",
        dispatched,
    )))
}

/// Accept a pending request as the calling donor.
///
/// Records the donor's intent only; no inventory is reserved.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/donate",
    params(("id" = String, Path, format = "uuid", description = "Request identifier")),
    responses(
        (status = 200, description = "Donation recorded", body = RequestActionResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Request or member not found", body = ErrorSchema),
        (status = 409, description = "Request no longer pending", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "donateToRequest",
    security(("SessionCookie" = []))
)]
#[post("/requests/{id}/donate")]
pub async fn donate_to_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestActionResponseBody>> {
    let caller = session.require_caller()?;
    let fulfilled = state
        .requests
        .donate(request_id(path.into_inner())?, &caller.smart_id)
        .await?;
    Ok(web::Json(RequestActionResponseBody::new(
        "Thank you for donating!",
        fulfilled,
    )))
}

/// Withdraw one of the caller's pending requests.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/cancel",
    params(("id" = String, Path, format = "uuid", description = "Request identifier")),
    responses(
        (status = 200, description = "Request cancelled", body = RequestActionResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller did not raise the request", body = ErrorSchema),
        (status = 404, description = "Request not found", body = ErrorSchema),
        (status = 409, description = "Request no longer pending", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "cancelRequest",
    security(("SessionCookie" = []))
)]
#[post("/requests/{id}/cancel")]
pub async fn cancel_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestActionResponseBody>> {
    let caller = session.require_caller()?;
    let cancelled = state
        .requests
        .cancel(request_id(path.into_inner())?, &caller.smart_id)
        .await?;
    Ok(web::Json(RequestActionResponseBody::new(
        "Request Cancelled",
        cancelled,
    )))
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
