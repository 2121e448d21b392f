use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::routes::auth::CurrentUser;
use crate::services::{access, registry, tracker};
use crate::telemetry::history;

use super::types::{
    FaultResponse, InstallationResponse, MoveResponse, PlantRef, PlantTargetRequest,
    ReadingResponse, SensorDetailResponse, SensorResponse, SensorUpdateRequest,
};

/// List sensors visible to the caller
#[utoipa::path(
    get,
    path = "/api/sensors",
    responses(
        (status = 200, description = "Sensors retrieved successfully", body = Vec<SensorResponse>),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<SensorResponse>>> {
    let sensors_list = access::visible_sensors(&state.db, &user).await?;
    let views = registry::describe_sensors(&state.db, sensors_list).await?;
    Ok(Json(views.into_iter().map(SensorResponse::from).collect()))
}

/// Get a sensor with its current plant and installation history
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    responses(
        (status = 200, description = "Sensor retrieved successfully", body = SensorDetailResponse),
        (status = 403, description = "Sensor belongs to another user"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<SensorDetailResponse>> {
    let sensor = access::require_sensor_access(&state.db, &user, &sensor_id).await?;
    let current_plant = tracker::current_plant(&state.db, &sensor.id).await?;
    let installations = tracker::history(&state.db, &sensor.id).await?;
    let view = registry::describe_sensor(&state.db, sensor).await?;

    Ok(Json(SensorDetailResponse {
        sensor: view.into(),
        current_plant: current_plant.map(PlantRef::from),
        installations: installations
            .into_iter()
            .map(InstallationResponse::from)
            .collect(),
    }))
}

/// Update a sensor's type, brand or fault code
#[utoipa::path(
    patch,
    path = "/api/sensors/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    request_body = SensorUpdateRequest,
    responses(
        (status = 200, description = "Sensor updated", body = SensorResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Sensor, type or brand not found"),
    ),
    tag = "sensors"
)]
pub async fn update_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
    Json(body): Json<SensorUpdateRequest>,
) -> AppResult<Json<SensorResponse>> {
    access::require_staff(&user)?;

    let changes = registry::SensorChanges {
        type_id: body.type_id,
        brand_id: body.brand_id,
        fault_code: body.fault_code,
    };
    let sensor = registry::update_sensor(&state.db, &sensor_id, changes).await?;
    let view = registry::describe_sensor(&state.db, sensor).await?;
    Ok(Json(view.into()))
}

/// Delete a sensor with its installations and telemetry
#[utoipa::path(
    delete,
    path = "/api/sensors/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    responses(
        (status = 204, description = "Sensor deleted"),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "sensors"
)]
pub async fn delete_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
) -> AppResult<StatusCode> {
    access::require_staff(&user)?;
    registry::delete_sensor(&state.db, &sensor_id).await?;
    state.invalidate_dashboards();
    Ok(StatusCode::NO_CONTENT)
}

/// Installation history of a sensor, oldest first
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/installations",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    responses(
        (status = 200, description = "Installations retrieved successfully", body = Vec<InstallationResponse>),
        (status = 403, description = "Sensor belongs to another user"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "sensors"
)]
pub async fn list_installations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<Vec<InstallationResponse>>> {
    let sensor = access::require_sensor_access(&state.db, &user, &sensor_id).await?;
    let installations = tracker::history(&state.db, &sensor.id).await?;
    Ok(Json(
        installations
            .into_iter()
            .map(InstallationResponse::from)
            .collect(),
    ))
}

/// Readings of a sensor, newest first
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/readings",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    responses(
        (status = 200, description = "Readings retrieved successfully", body = Vec<ReadingResponse>),
        (status = 403, description = "Sensor belongs to another user"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "sensors"
)]
pub async fn list_readings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<Vec<ReadingResponse>>> {
    let sensor = access::require_sensor_access(&state.db, &user, &sensor_id).await?;
    let tz = state.config.telemetry_timezone;
    let readings = history::readings_for_sensor(&state.db, &sensor.id).await?;
    Ok(Json(
        readings
            .into_iter()
            .map(|r| ReadingResponse::new(r, tz))
            .collect(),
    ))
}

/// Faults of a sensor, newest first
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/faults",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    responses(
        (status = 200, description = "Faults retrieved successfully", body = Vec<FaultResponse>),
        (status = 403, description = "Sensor belongs to another user"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "sensors"
)]
pub async fn list_faults(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<Vec<FaultResponse>>> {
    let sensor = access::require_sensor_access(&state.db, &user, &sensor_id).await?;
    let faults = history::faults_for_sensor(&state.db, &sensor.id).await?;
    Ok(Json(faults.into_iter().map(FaultResponse::from).collect()))
}

/// Install a sensor at a plant
#[utoipa::path(
    post,
    path = "/api/sensors/{sensor_id}/attach",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    request_body = PlantTargetRequest,
    responses(
        (status = 201, description = "Installation opened", body = InstallationResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Sensor or plant not found"),
        (status = 409, description = "Sensor already installed elsewhere"),
    ),
    tag = "installations"
)]
pub async fn attach_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
    Json(body): Json<PlantTargetRequest>,
) -> AppResult<(StatusCode, Json<InstallationResponse>)> {
    access::require_staff(&user)?;
    let installation = tracker::attach(&state.db, &sensor_id, body.plant_id, Utc::now()).await?;
    state.invalidate_dashboards();
    Ok((StatusCode::CREATED, Json(installation.into())))
}

/// Close a sensor's open installation at a plant
#[utoipa::path(
    post,
    path = "/api/sensors/{sensor_id}/detach",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    request_body = PlantTargetRequest,
    responses(
        (status = 200, description = "Installation closed", body = InstallationResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "No open installation at that plant"),
    ),
    tag = "installations"
)]
pub async fn detach_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
    Json(body): Json<PlantTargetRequest>,
) -> AppResult<Json<InstallationResponse>> {
    access::require_staff(&user)?;
    let installation = tracker::detach(&state.db, &sensor_id, body.plant_id, Utc::now()).await?;
    state.invalidate_dashboards();
    Ok(Json(installation.into()))
}

/// Move a sensor to another plant
#[utoipa::path(
    post,
    path = "/api/sensors/{sensor_id}/move",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    request_body = PlantTargetRequest,
    responses(
        (status = 200, description = "Sensor moved, or already there", body = MoveResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Plant not found or sensor not installed"),
    ),
    tag = "installations"
)]
pub async fn move_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
    Json(body): Json<PlantTargetRequest>,
) -> AppResult<Json<MoveResponse>> {
    access::require_staff(&user)?;
    let outcome = tracker::move_sensor(&state.db, &sensor_id, body.plant_id, Utc::now()).await?;
    state.invalidate_dashboards();
    Ok(Json(outcome.into()))
}

/// Reopen a sensor's most recent installation
#[utoipa::path(
    post,
    path = "/api/sensors/{sensor_id}/restore",
    params(
        ("sensor_id" = String, Path, description = "Sensor code"),
    ),
    responses(
        (status = 200, description = "Installation reopened", body = InstallationResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Sensor was never installed"),
        (status = 409, description = "Sensor already installed elsewhere"),
    ),
    tag = "installations"
)]
pub async fn restore_sensor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<InstallationResponse>> {
    access::require_staff(&user)?;
    let installation = tracker::restore(&state.db, &sensor_id).await?;
    state.invalidate_dashboards();
    Ok(Json(installation.into()))
}

/// Delete a reading together with its raw string
#[utoipa::path(
    delete,
    path = "/api/readings/{reading_id}",
    params(
        ("reading_id" = i32, Path, description = "Reading id"),
    ),
    responses(
        (status = 204, description = "Reading deleted"),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading not found"),
    ),
    tag = "sensors"
)]
pub async fn delete_reading(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(reading_id): Path<i32>,
) -> AppResult<StatusCode> {
    let reading = history::get_reading(&state.db, reading_id).await?;
    if !access::owns_sensor(&state.db, &user, &reading.sensor_id).await? {
        return Err(AppError::Authorization(format!(
            "Reading {reading_id} belongs to another user"
        )));
    }

    history::delete_reading(&state.db, reading.id).await?;
    state.invalidate_dashboards();
    Ok(StatusCode::NO_CONTENT)
}
