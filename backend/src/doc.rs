//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, the
//! request and response bodies and the error envelope. Swagger UI serves it
//! in debug builds and `openapi-dump` prints it for external tooling.

use crate::inbound::http::auth::{LoginRequest, LoginResponse, MeResponse};
use crate::inbound::http::inventory::{AddUnitsBody, AddUnitsResponseBody, BloodUnitBody};
use crate::inbound::http::requests::{
    BloodRequestBody, CreateRequestBody, CreateRequestResponseBody, RequestActionResponseBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "LifeLink backend API",
        description = "Blood inventory, request allocation and donor broadcast over a session-authenticated HTTP interface."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::me,
        crate::inbound::http::inventory::list_inventory,
        crate::inbound::http::inventory::add_inventory,
        crate::inbound::http::inventory::remove_inventory_unit,
        crate::inbound::http::requests::create_request,
        crate::inbound::http::requests::list_my_requests,
        crate::inbound::http::requests::list_all_requests,
        crate::inbound::http::requests::list_broadcasts,
        crate::inbound::http::requests::fulfill_request,
        crate::inbound::http::requests::dispatch_request,
        crate::inbound::http::requests::donate_to_request,
        crate::inbound::http::requests::cancel_request,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        MeResponse,
        BloodUnitBody,
        AddUnitsBody,
        AddUnitsResponseBody,
        CreateRequestBody,
        CreateRequestResponseBody,
        BloodRequestBody,
        RequestActionResponseBody,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "auth", description = "Session login and the caller's profile"),
        (name = "inventory", description = "Blood unit stock"),
        (name = "requests", description = "Blood requests, allocation and donor broadcast"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
