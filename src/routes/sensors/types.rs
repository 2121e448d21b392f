use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{faults, installations, plants, readings};
use crate::services::registry::SensorView;
use crate::services::tracker::MoveOutcome;

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorResponse {
    pub id: String,
    pub type_id: i32,
    pub type_name: String,
    pub brand_id: i32,
    pub brand_name: String,
    pub fault_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<SensorView> for SensorResponse {
    fn from(view: SensorView) -> Self {
        Self {
            created_at: view.sensor.created_at.with_timezone(&Utc),
            id: view.sensor.id,
            type_id: view.sensor.type_id,
            type_name: view.type_name,
            brand_id: view.sensor.brand_id,
            brand_name: view.brand_name,
            fault_code: view.sensor.fault_code,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlantRef {
    pub id: Uuid,
    pub name: String,
}

impl From<plants::Model> for PlantRef {
    fn from(plant: plants::Model) -> Self {
        Self {
            id: plant.id,
            name: plant.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstallationResponse {
    pub id: i32,
    pub plant_id: Uuid,
    pub sensor_id: String,
    pub started_at: DateTime<Utc>,
    /// Null while the installation is open
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<installations::Model> for InstallationResponse {
    fn from(i: installations::Model) -> Self {
        Self {
            id: i.id,
            plant_id: i.plant_id,
            sensor_id: i.sensor_id,
            started_at: i.started_at.with_timezone(&Utc),
            ended_at: i.ended_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorDetailResponse {
    #[serde(flatten)]
    pub sensor: SensorResponse,
    pub current_plant: Option<PlantRef>,
    pub installations: Vec<InstallationResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingResponse {
    pub id: i32,
    pub sensor_id: String,
    /// Decoded timestamp in the telemetry timezone, RFC 3339
    pub recorded_at: String,
    pub value: i64,
    pub message: Option<String>,
}

impl ReadingResponse {
    #[must_use]
    pub fn new(reading: readings::Model, tz: Tz) -> Self {
        Self {
            id: reading.id,
            recorded_at: reading.recorded_at.with_timezone(&tz).to_rfc3339(),
            sensor_id: reading.sensor_id,
            value: reading.value,
            message: reading.message,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaultResponse {
    pub id: i32,
    pub sensor_id: String,
    pub message: Option<String>,
}

impl From<faults::Model> for FaultResponse {
    fn from(f: faults::Model) -> Self {
        Self {
            id: f.id,
            sensor_id: f.sensor_id,
            message: f.message,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoveResponse {
    /// False when the sensor was already at the destination plant
    pub moved: bool,
    pub closed: Option<InstallationResponse>,
    pub current: InstallationResponse,
}

impl From<MoveOutcome> for MoveResponse {
    fn from(outcome: MoveOutcome) -> Self {
        match outcome {
            MoveOutcome::Unchanged(current) => Self {
                moved: false,
                closed: None,
                current: current.into(),
            },
            MoveOutcome::Moved { closed, opened } => Self {
                moved: true,
                closed: Some(closed.into()),
                current: opened.into(),
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SensorUpdateRequest {
    pub type_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub fault_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlantTargetRequest {
    pub plant_id: Uuid,
}
