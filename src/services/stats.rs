//! Dashboard aggregations over readings, faults and open installations.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::entity::{faults, installations, sensor_types, sensors};
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct ActiveSensors {
    pub sensors: Vec<sensors::Model>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct TypeUsage {
    pub type_name: String,
    pub sensor_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFaultCount {
    pub sensor_id: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct FaultTrend {
    /// Most recent faults first
    pub recent: Vec<faults::Model>,
    /// Fault count per sensor over `recent`, ordered by sensor id
    pub per_sensor: Vec<SensorFaultCount>,
}

/// Sensors currently installed at `plant_id` with at least one reading
/// timestamped at or after `since`.
pub async fn sensors_active_since<C: ConnectionTrait>(
    db: &C,
    plant_id: Uuid,
    since: DateTime<Utc>,
) -> AppResult<ActiveSensors> {
    let sensors_list = sensors::Entity::find()
        .inner_join(installations::Entity)
        .join(JoinType::InnerJoin, sensors::Relation::Readings.def())
        .filter(installations::Column::PlantId.eq(plant_id))
        .filter(installations::Column::EndedAt.is_null())
        .filter(crate::entity::readings::Column::RecordedAt.gte(since.fixed_offset()))
        .distinct()
        .order_by_asc(sensors::Column::Id)
        .all(db)
        .await?;

    Ok(ActiveSensors {
        count: sensors_list.len(),
        sensors: sensors_list,
    })
}

/// Number of sensors per type among those currently installed at `plant_id`,
/// ordered by type name.
pub async fn type_usage_counts<C: ConnectionTrait>(
    db: &C,
    plant_id: Uuid,
) -> AppResult<Vec<TypeUsage>> {
    Ok(sensors::Entity::find()
        .select_only()
        .column_as(sensor_types::Column::Name, "type_name")
        .column_as(
            Expr::col((sensors::Entity, sensors::Column::Id)).count(),
            "sensor_count",
        )
        .inner_join(installations::Entity)
        .inner_join(sensor_types::Entity)
        .filter(installations::Column::PlantId.eq(plant_id))
        .filter(installations::Column::EndedAt.is_null())
        .group_by(sensor_types::Column::Name)
        .order_by_asc(sensor_types::Column::Name)
        .into_model::<TypeUsage>()
        .all(db)
        .await?)
}

/// The `limit` most recent faults of sensors currently installed at
/// `plant_id`, with a per-sensor count over that same set.
pub async fn fault_trend<C: ConnectionTrait>(
    db: &C,
    plant_id: Uuid,
    limit: u64,
) -> AppResult<FaultTrend> {
    let recent = faults::Entity::find()
        .join(JoinType::InnerJoin, faults::Relation::Sensor.def())
        .join(JoinType::InnerJoin, sensors::Relation::Installations.def())
        .filter(installations::Column::PlantId.eq(plant_id))
        .filter(installations::Column::EndedAt.is_null())
        .order_by_desc(faults::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for fault in &recent {
        *counts.entry(fault.sensor_id.as_str()).or_default() += 1;
    }
    let per_sensor = counts
        .into_iter()
        .map(|(sensor_id, count)| SensorFaultCount {
            sensor_id: sensor_id.to_string(),
            count,
        })
        .collect();

    Ok(FaultTrend { recent, per_sensor })
}
