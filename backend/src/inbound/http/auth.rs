//! Identity endpoints.
//!
//! ```text
//! POST /api/v1/auth/login {"smartId":"bloodbank@lifelink.com","password":"password123"}
//! GET  /api/v1/auth/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials, LoginValidationError, Member, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// E-mail address or 10-digit phone number.
    pub smart_id: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.smart_id, &value.password)
    }
}

/// Caller summary returned after a successful login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub smart_id: String,
    #[schema(value_type = String, example = "bloodbank")]
    pub role: Role,
}

/// Profile of the signed-in member.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub full_name: String,
    pub smart_id: String,
    #[schema(value_type = String, example = "donor")]
    pub role: Role,
    #[schema(example = "O-")]
    pub blood_group: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MeResponse {
    fn from(member: Member) -> Self {
        Self {
            full_name: member.display_name.into(),
            smart_id: member.smart_id.into(),
            role: member.role,
            blood_group: member.blood_group.map(String::from),
            created_at: member.created_at,
        }
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptySmartId => Error::invalid_request("smartId must not be empty")
            .with_details(json!({ "field": "smartId", "code": "empty_smart_id" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate with the identity provider and open a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let caller = state.login.authenticate(&credentials).await?;
    session.persist_caller(&caller)?;
    Ok(web::Json(LoginResponse {
        smart_id: caller.smart_id.into(),
        role: caller.role,
    }))
}

/// Return the signed-in member's profile.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current member", body = MeResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Member no longer exists", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentMember",
    security(("SessionCookie" = []))
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let member = state.profile.fetch_profile(&caller.smart_id).await?;
    Ok(HttpResponse::Ok().json(MeResponse::from(member)))
}
