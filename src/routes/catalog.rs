use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::AppState;
use crate::entity::{sensor_brands, sensor_types};
use crate::error::AppResult;
use crate::routes::auth::CurrentUser;
use crate::services::{access, registry};

/// Sensor type or brand
#[derive(Debug, Serialize, ToSchema)]
pub struct LookupResponse {
    pub id: i32,
    pub name: String,
}

impl From<sensor_types::Model> for LookupResponse {
    fn from(t: sensor_types::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

impl From<sensor_brands::Model> for LookupResponse {
    fn from(b: sensor_brands::Model) -> Self {
        Self {
            id: b.id,
            name: b.name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LookupCreateRequest {
    pub name: String,
}

/// List sensor types
#[utoipa::path(
    get,
    path = "/api/sensor-types",
    responses(
        (status = 200, description = "Sensor types retrieved successfully", body = Vec<LookupResponse>),
    ),
    tag = "catalog"
)]
pub async fn list_sensor_types(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<LookupResponse>>> {
    let types = registry::list_sensor_types(&state.db).await?;
    Ok(Json(types.into_iter().map(LookupResponse::from).collect()))
}

/// Create a sensor type
#[utoipa::path(
    post,
    path = "/api/sensor-types",
    request_body = LookupCreateRequest,
    responses(
        (status = 201, description = "Sensor type created", body = LookupResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 409, description = "Name already taken"),
    ),
    tag = "catalog"
)]
pub async fn create_sensor_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<LookupCreateRequest>,
) -> AppResult<(StatusCode, Json<LookupResponse>)> {
    access::require_staff(&user)?;
    let created = registry::create_sensor_type(&state.db, &body.name).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Delete an unused sensor type
#[utoipa::path(
    delete,
    path = "/api/sensor-types/{type_id}",
    params(
        ("type_id" = i32, Path, description = "Sensor type id"),
    ),
    responses(
        (status = 204, description = "Sensor type deleted"),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Sensor type not found"),
        (status = 409, description = "Sensor type still in use"),
    ),
    tag = "catalog"
)]
pub async fn delete_sensor_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(type_id): Path<i32>,
) -> AppResult<StatusCode> {
    access::require_staff(&user)?;
    registry::delete_sensor_type(&state.db, type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List sensor brands
#[utoipa::path(
    get,
    path = "/api/sensor-brands",
    responses(
        (status = 200, description = "Sensor brands retrieved successfully", body = Vec<LookupResponse>),
    ),
    tag = "catalog"
)]
pub async fn list_sensor_brands(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<LookupResponse>>> {
    let brands = registry::list_sensor_brands(&state.db).await?;
    Ok(Json(brands.into_iter().map(LookupResponse::from).collect()))
}

/// Create a sensor brand
#[utoipa::path(
    post,
    path = "/api/sensor-brands",
    request_body = LookupCreateRequest,
    responses(
        (status = 201, description = "Sensor brand created", body = LookupResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 409, description = "Name already taken"),
    ),
    tag = "catalog"
)]
pub async fn create_sensor_brand(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<LookupCreateRequest>,
) -> AppResult<(StatusCode, Json<LookupResponse>)> {
    access::require_staff(&user)?;
    let created = registry::create_sensor_brand(&state.db, &body.name).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Delete an unused sensor brand
#[utoipa::path(
    delete,
    path = "/api/sensor-brands/{brand_id}",
    params(
        ("brand_id" = i32, Path, description = "Sensor brand id"),
    ),
    responses(
        (status = 204, description = "Sensor brand deleted"),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Sensor brand not found"),
        (status = 409, description = "Sensor brand still in use"),
    ),
    tag = "catalog"
)]
pub async fn delete_sensor_brand(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(brand_id): Path<i32>,
) -> AppResult<StatusCode> {
    access::require_staff(&user)?;
    registry::delete_sensor_brand(&state.db, brand_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
