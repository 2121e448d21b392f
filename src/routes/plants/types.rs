use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::plants;
use crate::routes::sensors::FaultResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct PlantResponse {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<plants::Model> for PlantResponse {
    fn from(p: plants::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            city: p.city,
            address: p.address,
            owner_id: p.owner_id,
            created_at: p.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlantCreateRequest {
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub address: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlantUpdateRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

/// Register a sensor and install it at the plant in one step
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlantSensorCreateRequest {
    pub id: String,
    pub type_id: i32,
    pub brand_id: i32,
    pub fault_code: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Activity window in hours (default: server configuration)
    pub hours: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TypeUsageResponse {
    pub type_name: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorFaultCountResponse {
    pub sensor_id: String,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub plant_id: Uuid,
    pub window_hours: i64,
    pub active_since: DateTime<Utc>,
    /// Installed sensors with at least one reading inside the window
    pub active_sensors: Vec<String>,
    pub active_count: usize,
    pub type_usage: Vec<TypeUsageResponse>,
    pub recent_faults: Vec<FaultResponse>,
    pub faults_per_sensor: Vec<SensorFaultCountResponse>,
}
