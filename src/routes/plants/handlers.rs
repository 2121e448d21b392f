use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::common::AppState;
use crate::config::MAX_WINDOW_HOURS;
use crate::error::{AppError, AppResult};
use crate::routes::auth::CurrentUser;
use crate::routes::cache;
use crate::routes::sensors::{FaultResponse, SensorResponse};
use crate::services::{access, registry, stats, tracker};

use super::types::{
    DashboardQuery, DashboardResponse, PlantCreateRequest, PlantResponse,
    PlantSensorCreateRequest, PlantUpdateRequest, SensorFaultCountResponse, TypeUsageResponse,
};

/// List plants visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/plants",
    responses(
        (status = 200, description = "Plants retrieved successfully", body = Vec<PlantResponse>),
    ),
    tag = "plants"
)]
pub async fn list_plants(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<PlantResponse>>> {
    let plants_list = access::plants_for(&state.db, &user).await?;
    Ok(Json(plants_list.into_iter().map(PlantResponse::from).collect()))
}

/// Create a plant
#[utoipa::path(
    post,
    path = "/api/plants",
    request_body = PlantCreateRequest,
    responses(
        (status = 201, description = "Plant created", body = PlantResponse),
        (status = 400, description = "Invalid plant fields"),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Owner not found"),
    ),
    tag = "plants"
)]
pub async fn create_plant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<PlantCreateRequest>,
) -> AppResult<(StatusCode, Json<PlantResponse>)> {
    access::require_staff(&user)?;

    let draft = registry::PlantDraft {
        name: body.name,
        city: body.city,
        address: body.address,
        owner_id: body.owner_id,
    };
    let plant = registry::create_plant(&state.db, draft, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(plant.into())))
}

/// Get a plant
#[utoipa::path(
    get,
    path = "/api/plants/{plant_id}",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
    ),
    responses(
        (status = 200, description = "Plant retrieved successfully", body = PlantResponse),
        (status = 403, description = "Plant belongs to another user"),
        (status = 404, description = "Plant not found"),
    ),
    tag = "plants"
)]
pub async fn get_plant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
) -> AppResult<Json<PlantResponse>> {
    let plant = access::require_plant_access(&state.db, &user, plant_id).await?;
    Ok(Json(plant.into()))
}

/// Update a plant
#[utoipa::path(
    patch,
    path = "/api/plants/{plant_id}",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
    ),
    request_body = PlantUpdateRequest,
    responses(
        (status = 200, description = "Plant updated", body = PlantResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Plant or owner not found"),
    ),
    tag = "plants"
)]
pub async fn update_plant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
    Json(body): Json<PlantUpdateRequest>,
) -> AppResult<Json<PlantResponse>> {
    access::require_staff(&user)?;

    let changes = registry::PlantChanges {
        name: body.name,
        city: body.city,
        address: body.address,
        owner_id: body.owner_id,
    };
    let plant = registry::update_plant(&state.db, plant_id, changes).await?;
    Ok(Json(plant.into()))
}

/// Delete a plant and its installation history
#[utoipa::path(
    delete,
    path = "/api/plants/{plant_id}",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
    ),
    responses(
        (status = 204, description = "Plant deleted"),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Plant not found"),
    ),
    tag = "plants"
)]
pub async fn delete_plant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    access::require_staff(&user)?;
    registry::delete_plant(&state.db, plant_id).await?;
    state.invalidate_dashboards();
    Ok(StatusCode::NO_CONTENT)
}

/// Sensors currently installed at a plant, newest first
#[utoipa::path(
    get,
    path = "/api/plants/{plant_id}/sensors/active",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
    ),
    responses(
        (status = 200, description = "Active sensors retrieved successfully", body = Vec<SensorResponse>),
        (status = 403, description = "Plant belongs to another user"),
        (status = 404, description = "Plant not found"),
    ),
    tag = "plants"
)]
pub async fn list_active_sensors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
) -> AppResult<Json<Vec<SensorResponse>>> {
    let plant = access::require_plant_access(&state.db, &user, plant_id).await?;
    let sensors_list = tracker::active_sensors(&state.db, plant.id).await?;
    let views = registry::describe_sensors(&state.db, sensors_list).await?;
    Ok(Json(views.into_iter().map(SensorResponse::from).collect()))
}

/// Sensors once installed at a plant and not installed anywhere now
#[utoipa::path(
    get,
    path = "/api/plants/{plant_id}/sensors/retired",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
    ),
    responses(
        (status = 200, description = "Retired sensors retrieved successfully", body = Vec<SensorResponse>),
        (status = 403, description = "Plant belongs to another user"),
        (status = 404, description = "Plant not found"),
    ),
    tag = "plants"
)]
pub async fn list_retired_sensors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
) -> AppResult<Json<Vec<SensorResponse>>> {
    let plant = access::require_plant_access(&state.db, &user, plant_id).await?;
    let sensors_list = tracker::retired_sensors(&state.db, plant.id).await?;
    let views = registry::describe_sensors(&state.db, sensors_list).await?;
    Ok(Json(views.into_iter().map(SensorResponse::from).collect()))
}

/// Register a sensor and install it at the plant
#[utoipa::path(
    post,
    path = "/api/plants/{plant_id}/sensors",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
    ),
    request_body = PlantSensorCreateRequest,
    responses(
        (status = 201, description = "Sensor registered and installed", body = SensorResponse),
        (status = 400, description = "Invalid sensor fields"),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Plant, type or brand not found"),
        (status = 409, description = "Sensor id already taken"),
    ),
    tag = "plants"
)]
pub async fn create_plant_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
    Json(body): Json<PlantSensorCreateRequest>,
) -> AppResult<(StatusCode, Json<SensorResponse>)> {
    access::require_staff(&user)?;

    let new = registry::NewSensor {
        id: body.id,
        type_id: body.type_id,
        brand_id: body.brand_id,
        fault_code: body.fault_code,
    };
    let sensor = registry::create_sensor(&state.db, new, Some(plant_id), Utc::now()).await?;
    state.invalidate_dashboards();

    let view = registry::describe_sensor(&state.db, sensor).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// Plant dashboard: recent activity, type usage and fault trend
#[utoipa::path(
    get,
    path = "/api/plants/{plant_id}/dashboard",
    params(
        ("plant_id" = Uuid, Path, description = "Plant UUID"),
        DashboardQuery,
    ),
    responses(
        (status = 200, description = "Dashboard computed", body = DashboardResponse),
        (status = 400, description = "Invalid window"),
        (status = 403, description = "Plant belongs to another user"),
        (status = 404, description = "Plant not found"),
    ),
    tag = "plants"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plant_id): Path<Uuid>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Response> {
    let plant = access::require_plant_access(&state.db, &user, plant_id).await?;

    let window_hours = query.hours.unwrap_or(state.config.active_window_hours);
    if !(1..=MAX_WINDOW_HOURS).contains(&window_hours) {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {MAX_WINDOW_HOURS}"
        )));
    }

    let key = cache::cache_key(
        "dashboard",
        &[&plant.id.to_string(), &window_hours.to_string()],
    );
    if let Some(cached) = cache::get_cached(&state, &key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    let active_since = Utc::now() - Duration::hours(window_hours);
    let active = stats::sensors_active_since(&state.db, plant.id, active_since).await?;
    let type_usage = stats::type_usage_counts(&state.db, plant.id).await?;
    let trend = stats::fault_trend(&state.db, plant.id, state.config.fault_trend_limit).await?;

    let response = DashboardResponse {
        plant_id: plant.id,
        window_hours,
        active_since,
        active_count: active.count,
        active_sensors: active.sensors.into_iter().map(|s| s.id).collect(),
        type_usage: type_usage
            .into_iter()
            .map(|t| TypeUsageResponse {
                type_name: t.type_name,
                count: t.sensor_count,
            })
            .collect(),
        recent_faults: trend.recent.into_iter().map(FaultResponse::from).collect(),
        faults_per_sensor: trend
            .per_sensor
            .into_iter()
            .map(|c| SensorFaultCountResponse {
                sensor_id: c.sensor_id,
                count: c.count,
            })
            .collect(),
    };

    cache::cache_and_respond(&state, key, &response).await
}
