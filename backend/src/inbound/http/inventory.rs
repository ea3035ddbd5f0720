//! Inventory Ledger HTTP handlers.
//!
//! ```text
//! GET    /api/v1/inventory/
//! POST   /api/v1/inventory/add {"bloodGroup":"A+","quantity":4}
//! DELETE /api/v1/inventory/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::AddUnitsRequest;
use crate::domain::{
    BloodGroup, BloodUnit, ComponentType, MAX_UNITS_PER_ADDITION, SmartId, UnitId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, blank_field_error, parse_optional_rfc3339_timestamp, parse_uuid, require_in_range,
};

/// One blood unit as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodUnitBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "W1234 56789 01")]
    pub tracking_code: String,
    #[schema(example = "Whole Blood")]
    pub component_type: String,
    #[schema(example = "A+")]
    pub blood_group: String,
    pub collection_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    #[schema(example = "Available")]
    pub status: String,
    #[schema(example = "Central Blood Bank")]
    pub institution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "uuid")]
    pub reserved_for: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BloodUnit> for BloodUnitBody {
    fn from(unit: BloodUnit) -> Self {
        Self {
            id: unit.id.to_string(),
            tracking_code: unit.tracking_code.as_str().to_owned(),
            component_type: unit.component_type.as_str().to_owned(),
            blood_group: unit.blood_group.into(),
            collection_date: unit.collection_date,
            expiry_date: unit.expiry_date,
            status: unit.status.as_str().to_owned(),
            institution: unit.institution,
            reserved_for: unit.reserved_for.map(|id| id.to_string()),
            created_at: unit.created_at,
        }
    }
}

/// Stock addition payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUnitsBody {
    #[schema(example = "O-")]
    pub blood_group: String,
    /// Defaults to `Whole Blood`.
    pub component_type: Option<String>,
    /// Defaults to one unit.
    #[schema(minimum = 1, maximum = 100)]
    pub quantity: Option<i64>,
    #[schema(format = "date-time")]
    pub collection_date: Option<String>,
}

/// Stock addition result.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUnitsResponseBody {
    #[schema(example = "Successfully added 4 units")]
    pub message: String,
    pub units: Vec<BloodUnitBody>,
}

fn parse_add_units(body: AddUnitsBody, caller: SmartId) -> ApiResult<AddUnitsRequest> {
    const BLOOD_GROUP: FieldName = FieldName::new("bloodGroup");
    let blood_group =
        BloodGroup::new(&body.blood_group).map_err(|_| blank_field_error(BLOOD_GROUP))?;
    let quantity = require_in_range(
        body.quantity.unwrap_or(1),
        1,
        i64::from(MAX_UNITS_PER_ADDITION),
        FieldName::new("quantity"),
    )?;
    let collection_date =
        parse_optional_rfc3339_timestamp(body.collection_date, FieldName::new("collectionDate"))?;
    Ok(AddUnitsRequest {
        caller,
        blood_group,
        component_type: ComponentType::new_or_default(body.component_type.as_deref()),
        quantity,
        collection_date,
    })
}

/// List every unit in the ledger.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/",
    responses(
        (status = 200, description = "All units", body = [BloodUnitBody]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["inventory"],
    operation_id = "listInventory",
    security(("SessionCookie" = []))
)]
#[get("/inventory/")]
pub async fn list_inventory(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BloodUnitBody>>> {
    session.require_caller()?;
    let units = state.inventory_query.list_units().await?;
    Ok(web::Json(units.into_iter().map(BloodUnitBody::from).collect()))
}

/// Record new stock, then auto-approve pending requests it can satisfy.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/add",
    request_body = AddUnitsBody,
    responses(
        (status = 201, description = "Units recorded", body = AddUnitsResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Caller is not a member", body = ErrorSchema),
        (status = 409, description = "Tracking codes exhausted", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["inventory"],
    operation_id = "addInventory",
    security(("SessionCookie" = []))
)]
#[post("/inventory/add")]
pub async fn add_inventory(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AddUnitsBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller()?;
    let request = parse_add_units(payload.into_inner(), caller.smart_id)?;
    let added = state.inventory.add_units(request).await?;
    let units: Vec<BloodUnitBody> = added.units.into_iter().map(BloodUnitBody::from).collect();
    Ok(HttpResponse::Created().json(AddUnitsResponseBody {
        message: format!("Successfully added {} units", units.len()),
        units,
    }))
}

/// Remove a unit record.
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, format = "uuid", description = "Unit identifier")),
    responses(
        (status = 204, description = "Unit removed"),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unit not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["inventory"],
    operation_id = "removeInventoryUnit",
    security(("SessionCookie" = []))
)]
#[delete("/inventory/{id}")]
pub async fn remove_inventory_unit(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_caller()?;
    let unit_id = UnitId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("id"))?);
    state.inventory.remove_unit(unit_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
