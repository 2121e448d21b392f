use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};

use crate::entity::{faults, raw_strings, readings};
use crate::error::{AppError, AppResult};

/// Readings of a sensor, newest timestamp first.
pub async fn readings_for_sensor<C: ConnectionTrait>(
    db: &C,
    sensor_id: &str,
) -> AppResult<Vec<readings::Model>> {
    Ok(readings::Entity::find()
        .filter(readings::Column::SensorId.eq(sensor_id))
        .order_by_desc(readings::Column::RecordedAt)
        .order_by_desc(readings::Column::Id)
        .all(db)
        .await?)
}

/// Faults of a sensor, most recently received first.
pub async fn faults_for_sensor<C: ConnectionTrait>(
    db: &C,
    sensor_id: &str,
) -> AppResult<Vec<faults::Model>> {
    Ok(faults::Entity::find()
        .filter(faults::Column::SensorId.eq(sensor_id))
        .order_by_desc(faults::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_reading<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<readings::Model> {
    readings::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading {id} not found")))
}

/// Delete a reading together with the raw string it was decoded from.
pub async fn delete_reading<C>(db: &C, id: i32) -> AppResult<readings::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let reading = get_reading(&txn, id).await?;
    readings::Entity::delete_by_id(reading.id).exec(&txn).await?;
    raw_strings::Entity::delete_by_id(reading.raw_string_id)
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(reading_id = id, sensor_id = %reading.sensor_id, "Reading deleted");
    Ok(reading)
}
