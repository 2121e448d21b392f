//! Time-ranged attachment of sensors to plants.
//!
//! A sensor has at most one open installation (`ended_at IS NULL`). The rule
//! is checked inside each mutating transaction and backed by a partial unique
//! index, so attach and restore fail with `AppError::Conflict` instead of
//! silently opening a second installation.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{installations, plants, sensors};
use crate::error::{AppError, AppResult};

/// Result of a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The sensor was already at the destination plant.
    Unchanged(installations::Model),
    Moved {
        closed: installations::Model,
        opened: installations::Model,
    },
}

impl MoveOutcome {
    /// The installation that is open after the move.
    #[must_use]
    pub fn current(&self) -> &installations::Model {
        match self {
            Self::Unchanged(current) => current,
            Self::Moved { opened, .. } => opened,
        }
    }
}

async fn require_sensor<C: ConnectionTrait>(db: &C, sensor_id: &str) -> AppResult<sensors::Model> {
    sensors::Entity::find_by_id(sensor_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sensor '{sensor_id}' not found")))
}

async fn require_plant<C: ConnectionTrait>(db: &C, plant_id: Uuid) -> AppResult<plants::Model> {
    plants::Entity::find_by_id(plant_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plant {plant_id} not found")))
}

async fn open_installation<C: ConnectionTrait>(
    db: &C,
    sensor_id: &str,
    plant_id: Uuid,
    started_at: DateTime<Utc>,
) -> AppResult<installations::Model> {
    Ok(installations::ActiveModel {
        plant_id: Set(plant_id),
        sensor_id: Set(sensor_id.to_string()),
        started_at: Set(started_at.fixed_offset()),
        ended_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

async fn close_installation<C: ConnectionTrait>(
    db: &C,
    installation: installations::Model,
    ended_at: DateTime<Utc>,
) -> AppResult<installations::Model> {
    let mut active: installations::ActiveModel = installation.into();
    active.ended_at = Set(Some(ended_at.fixed_offset()));
    Ok(active.update(db).await?)
}

/// The sensor's open installation, if any.
pub async fn current_installation<C: ConnectionTrait>(
    db: &C,
    sensor_id: &str,
) -> AppResult<Option<installations::Model>> {
    Ok(installations::Entity::find()
        .filter(installations::Column::SensorId.eq(sensor_id))
        .filter(installations::Column::EndedAt.is_null())
        .order_by_desc(installations::Column::Id)
        .one(db)
        .await?)
}

/// The plant that currently owns the sensor, derived from its open installation.
pub async fn current_plant<C: ConnectionTrait>(
    db: &C,
    sensor_id: &str,
) -> AppResult<Option<plants::Model>> {
    match current_installation(db, sensor_id).await? {
        Some(installation) => Ok(plants::Entity::find_by_id(installation.plant_id)
            .one(db)
            .await?),
        None => Ok(None),
    }
}

/// All installations of a sensor in insertion order.
pub async fn history<C: ConnectionTrait>(
    db: &C,
    sensor_id: &str,
) -> AppResult<Vec<installations::Model>> {
    Ok(installations::Entity::find()
        .filter(installations::Column::SensorId.eq(sensor_id))
        .order_by_asc(installations::Column::Id)
        .all(db)
        .await?)
}

/// Open a new installation of `sensor_id` at `plant_id`.
///
/// # Errors
///
/// - `AppError::NotFound` if the sensor or plant does not exist
/// - `AppError::Conflict` if the sensor already has an open installation
pub async fn attach<C>(
    db: &C,
    sensor_id: &str,
    plant_id: Uuid,
    started_at: DateTime<Utc>,
) -> AppResult<installations::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    require_sensor(&txn, sensor_id).await?;
    require_plant(&txn, plant_id).await?;

    if let Some(open) = current_installation(&txn, sensor_id).await? {
        return Err(AppError::Conflict(format!(
            "Sensor '{sensor_id}' is already installed at plant {}",
            open.plant_id
        )));
    }

    let installation = open_installation(&txn, sensor_id, plant_id, started_at).await?;
    txn.commit().await?;

    tracing::info!(
        sensor_id = %sensor_id,
        plant_id = %plant_id,
        installation_id = installation.id,
        "Sensor attached"
    );
    Ok(installation)
}

/// Close the sensor's open installation at `plant_id`.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the sensor has no open installation there.
pub async fn detach<C>(
    db: &C,
    sensor_id: &str,
    plant_id: Uuid,
    ended_at: DateTime<Utc>,
) -> AppResult<installations::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let open = installations::Entity::find()
        .filter(installations::Column::SensorId.eq(sensor_id))
        .filter(installations::Column::PlantId.eq(plant_id))
        .filter(installations::Column::EndedAt.is_null())
        .order_by_desc(installations::Column::Id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Sensor '{sensor_id}' has no open installation at plant {plant_id}"
            ))
        })?;

    let closed = close_installation(&txn, open, ended_at).await?;
    txn.commit().await?;

    tracing::info!(
        sensor_id = %sensor_id,
        plant_id = %plant_id,
        installation_id = closed.id,
        "Sensor detached"
    );
    Ok(closed)
}

/// Move a sensor to another plant.
///
/// Closes the current installation and opens a new one at `to_plant`, both
/// stamped with `at`. Moving to the plant the sensor is already at changes
/// nothing.
///
/// # Errors
///
/// - `AppError::NotFound` if the plant does not exist or the sensor is not
///   currently installed anywhere
pub async fn move_sensor<C>(
    db: &C,
    sensor_id: &str,
    to_plant: Uuid,
    at: DateTime<Utc>,
) -> AppResult<MoveOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    require_plant(&txn, to_plant).await?;
    let current = current_installation(&txn, sensor_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Sensor '{sensor_id}' is not installed at any plant"))
        })?;

    if current.plant_id == to_plant {
        return Ok(MoveOutcome::Unchanged(current));
    }

    let from_plant = current.plant_id;
    let closed = close_installation(&txn, current, at).await?;
    let opened = open_installation(&txn, sensor_id, to_plant, at).await?;
    txn.commit().await?;

    tracing::info!(
        sensor_id = %sensor_id,
        from_plant = %from_plant,
        to_plant = %to_plant,
        "Sensor moved"
    );
    Ok(MoveOutcome::Moved { closed, opened })
}

/// Reopen the sensor's most recent installation.
///
/// No new row is created. Restoring an installation that is already open
/// returns it unchanged.
///
/// # Errors
///
/// - `AppError::NotFound` if the sensor has never been installed
/// - `AppError::Conflict` if a different installation of the sensor is open
pub async fn restore<C>(db: &C, sensor_id: &str) -> AppResult<installations::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let latest = installations::Entity::find()
        .filter(installations::Column::SensorId.eq(sensor_id))
        .order_by_desc(installations::Column::Id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Sensor '{sensor_id}' has no installation to restore"))
        })?;

    if latest.is_open() {
        return Ok(latest);
    }

    if let Some(open) = current_installation(&txn, sensor_id).await? {
        return Err(AppError::Conflict(format!(
            "Sensor '{sensor_id}' is already installed at plant {}",
            open.plant_id
        )));
    }

    let mut active: installations::ActiveModel = latest.into();
    active.ended_at = Set(None);
    let restored = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        sensor_id = %sensor_id,
        plant_id = %restored.plant_id,
        installation_id = restored.id,
        "Sensor restored"
    );
    Ok(restored)
}

/// Sensors whose open installation is at `plant_id`, newest sensor first.
pub async fn active_sensors<C: ConnectionTrait>(
    db: &C,
    plant_id: Uuid,
) -> AppResult<Vec<sensors::Model>> {
    Ok(sensors::Entity::find()
        .inner_join(installations::Entity)
        .filter(installations::Column::PlantId.eq(plant_id))
        .filter(installations::Column::EndedAt.is_null())
        .order_by_desc(sensors::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Sensors with a closed installation at `plant_id` that are not installed anywhere now.
pub async fn retired_sensors<C: ConnectionTrait>(
    db: &C,
    plant_id: Uuid,
) -> AppResult<Vec<sensors::Model>> {
    let installed_somewhere = Query::select()
        .column(installations::Column::SensorId)
        .from(installations::Entity)
        .and_where(installations::Column::EndedAt.is_null())
        .to_owned();

    Ok(sensors::Entity::find()
        .inner_join(installations::Entity)
        .filter(installations::Column::PlantId.eq(plant_id))
        .filter(installations::Column::EndedAt.is_not_null())
        .filter(sensors::Column::Id.not_in_subquery(installed_somewhere))
        .distinct()
        .order_by_desc(sensors::Column::CreatedAt)
        .all(db)
        .await?)
}
