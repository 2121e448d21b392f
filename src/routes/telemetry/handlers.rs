use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono_tz::Tz;

use crate::common::AppState;
use crate::entity::{readings, sensors, users};
use crate::error::{AppError, AppResult};
use crate::routes::auth::CurrentUser;
use crate::services::{access, registry};
use crate::telemetry::{self, history, ingest::validate_payload};

use super::types::{
    AddReadingRequest, ImportResponse, IngestStatus, RejectedLineResponse, RilevazioneQuery,
    RilevazioneResponse, SensoreQuery, SensoreResponse,
};

const UNKNOWN_SENSOR: &str = "id_sensore non presente nel sistema";
const UNKNOWN_READING: &str = "rilevazione non presente nel sistema";

fn rilevazione_response(reading: readings::Model, tz: Tz) -> RilevazioneResponse {
    RilevazioneResponse {
        dataora: reading.recorded_at.with_timezone(&tz).to_rfc3339(),
        id_sensore: reading.sensor_id,
        valore: reading.value,
        messaggio: reading.message,
    }
}

fn sensore_response(view: registry::SensorView) -> SensoreResponse {
    SensoreResponse {
        id_sensore: view.sensor.id,
        tipo: view.type_name,
        marca: view.brand_name,
        codice_errore: view.sensor.fault_code,
    }
}

/// Look up a sensor named in the query string, answering the legacy 400 when it is missing.
async fn sensor_from_query(
    state: &AppState,
    user: &users::Model,
    id_sensore: Option<&str>,
) -> AppResult<sensors::Model> {
    let id = id_sensore.ok_or_else(|| AppError::BadRequest(UNKNOWN_SENSOR.to_string()))?;
    match access::require_sensor_access(&state.db, user, id).await {
        Err(AppError::NotFound(_)) => Err(AppError::BadRequest(UNKNOWN_SENSOR.to_string())),
        other => other,
    }
}

/// Ingest one raw telemetry string
#[utoipa::path(
    post,
    path = "/api/rilevazioni/add",
    request_body = AddReadingRequest,
    responses(
        (status = 201, description = "Raw string stored and decoded", body = IngestStatus),
        (status = 400, description = "Invalid body or undecodable string", body = IngestStatus),
        (status = 401, description = "Missing or invalid credentials"),
    ),
    tag = "telemetry"
)]
pub async fn add_reading(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AddReadingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<IngestStatus>)> {
    let request = match payload {
        Ok(Json(request)) if validate_payload(&request.stringa).is_ok() => request,
        Ok(_) => return Ok((StatusCode::BAD_REQUEST, Json(IngestStatus::fail()))),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Ingestion body rejected");
            return Ok((StatusCode::BAD_REQUEST, Json(IngestStatus::fail())));
        }
    };

    match telemetry::ingest(&state.db, state.config.telemetry_timezone, &request.stringa).await {
        Ok(ingested) => {
            state.invalidate_dashboards();
            tracing::debug!(
                username = %user.username,
                sensor_id = %ingested.outcome.sensor_id(),
                raw_string_id = ingested.raw_string.id,
                "Telemetry accepted"
            );
            Ok((StatusCode::CREATED, Json(IngestStatus::ok())))
        }
        Err(e) if e.is_decode_failure() => {
            tracing::warn!(username = %user.username, error = %e, "Telemetry rejected");
            Ok((StatusCode::BAD_REQUEST, Json(IngestStatus::bad_format())))
        }
        Err(e) => Err(e),
    }
}

/// List the sensors visible to the caller
#[utoipa::path(
    get,
    path = "/api/sensori",
    responses(
        (status = 200, description = "Sensors retrieved successfully", body = Vec<SensoreResponse>),
        (status = 401, description = "Missing or invalid credentials"),
    ),
    tag = "telemetry"
)]
pub async fn list_sensori(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<SensoreResponse>>> {
    let sensors_list = access::visible_sensors(&state.db, &user).await?;
    let views = registry::describe_sensors(&state.db, sensors_list).await?;
    Ok(Json(views.into_iter().map(sensore_response).collect()))
}

/// Show one sensor
#[utoipa::path(
    get,
    path = "/api/sensori/show",
    params(SensoreQuery),
    responses(
        (status = 200, description = "Sensor retrieved successfully", body = SensoreResponse),
        (status = 400, description = "Unknown sensor id"),
        (status = 403, description = "Sensor belongs to another user"),
    ),
    tag = "telemetry"
)]
pub async fn show_sensore(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SensoreQuery>,
) -> AppResult<Json<SensoreResponse>> {
    let sensor = sensor_from_query(&state, &user, query.id_sensore.as_deref()).await?;
    let view = registry::describe_sensor(&state.db, sensor).await?;
    Ok(Json(sensore_response(view)))
}

/// List the readings of a sensor, newest first
#[utoipa::path(
    get,
    path = "/api/rilevazioni",
    params(SensoreQuery),
    responses(
        (status = 200, description = "Readings retrieved successfully", body = Vec<RilevazioneResponse>),
        (status = 400, description = "Unknown sensor id"),
        (status = 403, description = "Sensor belongs to another user"),
    ),
    tag = "telemetry"
)]
pub async fn list_rilevazioni(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SensoreQuery>,
) -> AppResult<Json<Vec<RilevazioneResponse>>> {
    let sensor = sensor_from_query(&state, &user, query.id_sensore.as_deref()).await?;
    let tz = state.config.telemetry_timezone;

    let response = history::readings_for_sensor(&state.db, &sensor.id)
        .await?
        .into_iter()
        .map(|r| rilevazione_response(r, tz))
        .collect();

    Ok(Json(response))
}

/// Show one reading
#[utoipa::path(
    get,
    path = "/api/rilevazioni/show",
    params(RilevazioneQuery),
    responses(
        (status = 200, description = "Reading retrieved successfully", body = RilevazioneResponse),
        (status = 400, description = "Unknown reading id"),
        (status = 403, description = "Reading belongs to another user"),
    ),
    tag = "telemetry"
)]
pub async fn show_rilevazione(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RilevazioneQuery>,
) -> AppResult<Json<RilevazioneResponse>> {
    let unknown = || AppError::BadRequest(UNKNOWN_READING.to_string());

    let id = query
        .id
        .as_deref()
        .and_then(|id| id.trim().parse::<i32>().ok())
        .ok_or_else(unknown)?;
    let reading = match history::get_reading(&state.db, id).await {
        Err(AppError::NotFound(_)) => return Err(unknown()),
        other => other?,
    };

    if !access::owns_sensor(&state.db, &user, &reading.sensor_id).await? {
        return Err(AppError::Authorization(format!(
            "Reading {id} belongs to another user"
        )));
    }

    Ok(Json(rilevazione_response(
        reading,
        state.config.telemetry_timezone,
    )))
}

/// Import raw strings from a CSV upload with a `stringa` column
#[utoipa::path(
    post,
    path = "/api/stringhe/import",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 400, description = "Malformed CSV"),
        (status = 403, description = "Staff privileges required"),
    ),
    tag = "telemetry"
)]
pub async fn import_stringhe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> AppResult<Json<ImportResponse>> {
    access::require_staff(&user)?;

    let payloads = telemetry::ingest::read_csv_payloads(&body)?;
    let report =
        telemetry::ingest_batch(&state.db, state.config.telemetry_timezone, &payloads).await?;
    if report.accepted > 0 {
        state.invalidate_dashboards();
    }

    Ok(Json(ImportResponse {
        accepted: report.accepted,
        rejected: report
            .rejected
            .into_iter()
            .map(|r| RejectedLineResponse {
                line: r.line,
                stringa: r.payload,
                reason: r.reason,
            })
            .collect(),
    }))
}
