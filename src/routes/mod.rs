pub mod auth;
pub mod cache;
pub mod catalog;
pub mod health;
pub mod plants;
pub mod sensors;
pub mod telemetry;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::services::rate_limit::ClientIpKeyExtractor;

/// Largest accepted request body; CSV imports are the biggest payloads
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        telemetry::add_reading,
        telemetry::list_sensori,
        telemetry::show_sensore,
        telemetry::list_rilevazioni,
        telemetry::show_rilevazione,
        telemetry::import_stringhe,
        plants::list_plants,
        plants::create_plant,
        plants::get_plant,
        plants::update_plant,
        plants::delete_plant,
        plants::list_active_sensors,
        plants::list_retired_sensors,
        plants::create_plant_sensor,
        plants::get_dashboard,
        sensors::list_sensors,
        sensors::get_sensor,
        sensors::update_sensor,
        sensors::delete_sensor,
        sensors::list_installations,
        sensors::list_readings,
        sensors::list_faults,
        sensors::attach_sensor,
        sensors::detach_sensor,
        sensors::move_sensor,
        sensors::restore_sensor,
        sensors::delete_reading,
        catalog::list_sensor_types,
        catalog::create_sensor_type,
        catalog::delete_sensor_type,
        catalog::list_sensor_brands,
        catalog::create_sensor_brand,
        catalog::delete_sensor_brand,
    ),
    components(
        schemas(
            telemetry::AddReadingRequest,
            telemetry::IngestStatus,
            telemetry::SensoreResponse,
            telemetry::RilevazioneResponse,
            telemetry::ImportResponse,
            telemetry::RejectedLineResponse,
            plants::PlantResponse,
            plants::PlantCreateRequest,
            plants::PlantUpdateRequest,
            plants::PlantSensorCreateRequest,
            plants::DashboardResponse,
            plants::TypeUsageResponse,
            plants::SensorFaultCountResponse,
            sensors::SensorResponse,
            sensors::SensorDetailResponse,
            sensors::SensorUpdateRequest,
            sensors::PlantRef,
            sensors::InstallationResponse,
            sensors::ReadingResponse,
            sensors::FaultResponse,
            sensors::MoveResponse,
            sensors::PlantTargetRequest,
            catalog::LookupResponse,
            catalog::LookupCreateRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "telemetry", description = "Telemetry ingestion and query for field gateways"),
        (name = "plants", description = "Plants, their sensors and dashboard"),
        (name = "sensors", description = "Sensors and their telemetry history"),
        (name = "installations", description = "Attaching sensors to plants over time"),
        (name = "catalog", description = "Sensor types and brands"),
    ),
    info(
        title = "Plant Telemetry API",
        description = "Sensor installations and decoded telemetry for industrial plants",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            ingest_rate = %format!("{}/s burst {}", config.rate_limit_ingest_per_second, config.rate_limit_ingest_burst),
            query_rate = %format!("{}/s burst {}", config.rate_limit_query_per_second, config.rate_limit_query_burst),
            "Rate limiting configured"
        );
    }

    // Telemetry written by field gateways
    let ingest_routes_base = Router::new()
        .route("/rilevazioni/add", post(telemetry::add_reading))
        .route("/stringhe/import", post(telemetry::import_stringhe));

    let query_routes_base = Router::new()
        // Gateway API
        .route("/sensori", get(telemetry::list_sensori))
        .route("/sensori/show", get(telemetry::show_sensore))
        .route("/rilevazioni", get(telemetry::list_rilevazioni))
        .route("/rilevazioni/show", get(telemetry::show_rilevazione))
        // Plants
        .route("/plants", get(plants::list_plants).post(plants::create_plant))
        .route(
            "/plants/{plant_id}",
            get(plants::get_plant)
                .patch(plants::update_plant)
                .delete(plants::delete_plant),
        )
        .route("/plants/{plant_id}/sensors", post(plants::create_plant_sensor))
        .route(
            "/plants/{plant_id}/sensors/active",
            get(plants::list_active_sensors),
        )
        .route(
            "/plants/{plant_id}/sensors/retired",
            get(plants::list_retired_sensors),
        )
        .route("/plants/{plant_id}/dashboard", get(plants::get_dashboard))
        // Sensors
        .route("/sensors", get(sensors::list_sensors))
        .route(
            "/sensors/{sensor_id}",
            get(sensors::get_sensor)
                .patch(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        .route(
            "/sensors/{sensor_id}/installations",
            get(sensors::list_installations),
        )
        .route("/sensors/{sensor_id}/readings", get(sensors::list_readings))
        .route("/sensors/{sensor_id}/faults", get(sensors::list_faults))
        .route("/sensors/{sensor_id}/attach", post(sensors::attach_sensor))
        .route("/sensors/{sensor_id}/detach", post(sensors::detach_sensor))
        .route("/sensors/{sensor_id}/move", post(sensors::move_sensor))
        .route("/sensors/{sensor_id}/restore", post(sensors::restore_sensor))
        .route("/readings/{reading_id}", delete(sensors::delete_reading))
        // Catalog
        .route(
            "/sensor-types",
            get(catalog::list_sensor_types).post(catalog::create_sensor_type),
        )
        .route(
            "/sensor-types/{type_id}",
            delete(catalog::delete_sensor_type),
        )
        .route(
            "/sensor-brands",
            get(catalog::list_sensor_brands).post(catalog::create_sensor_brand),
        )
        .route(
            "/sensor-brands/{brand_id}",
            delete(catalog::delete_sensor_brand),
        );

    // Combine API routes, conditionally applying rate limiting
    let api_routes = if config.disable_rate_limiting {
        Router::new()
            .merge(ingest_routes_base)
            .merge(query_routes_base)
    } else {
        let ingest_limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_ingest_per_second)
            .burst_size(config.rate_limit_ingest_burst)
            .finish()
            .expect("Failed to create ingest rate limiter");

        let query_limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_query_per_second)
            .burst_size(config.rate_limit_query_burst)
            .finish()
            .expect("Failed to create query rate limiter");

        Router::new()
            .merge(ingest_routes_base.layer(GovernorLayer {
                config: Arc::new(ingest_limiter),
            }))
            .merge(query_routes_base.layer(GovernorLayer {
                config: Arc::new(query_limiter),
            }))
    }
    .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Combine all routes
    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
