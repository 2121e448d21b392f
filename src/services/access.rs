//! Ownership predicates used by the HTTP layer.
//!
//! Staff users own everything. Everyone else owns the plants they are the
//! owner of, and the sensors currently installed at those plants.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use uuid::Uuid;

use crate::entity::{installations, plants, sensors, users};
use crate::error::{AppError, AppResult};
use crate::services::tracker;

pub fn require_staff(user: &users::Model) -> AppResult<()> {
    if user.is_staff {
        Ok(())
    } else {
        Err(AppError::Authorization("Staff privileges required".to_string()))
    }
}

#[must_use]
pub fn owns_plant(user: &users::Model, plant: &plants::Model) -> bool {
    user.is_staff || plant.owner_id == user.id
}

/// Whether `user` owns the sensor's current plant.
///
/// A sensor that is not installed anywhere belongs to staff only.
pub async fn owns_sensor<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
    sensor_id: &str,
) -> AppResult<bool> {
    if user.is_staff {
        return Ok(true);
    }
    Ok(tracker::current_plant(db, sensor_id)
        .await?
        .is_some_and(|plant| plant.owner_id == user.id))
}

/// Load a plant the user is allowed to see.
///
/// # Errors
///
/// - `AppError::NotFound` if the plant does not exist
/// - `AppError::Authorization` if the user does not own it
pub async fn require_plant_access<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
    plant_id: Uuid,
) -> AppResult<plants::Model> {
    let plant = plants::Entity::find_by_id(plant_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plant {plant_id} not found")))?;

    if !owns_plant(user, &plant) {
        return Err(AppError::Authorization(format!(
            "Plant {plant_id} belongs to another user"
        )));
    }
    Ok(plant)
}

/// Load a sensor the user is allowed to see.
///
/// # Errors
///
/// - `AppError::NotFound` if the sensor does not exist
/// - `AppError::Authorization` if the user does not own its current plant
pub async fn require_sensor_access<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
    sensor_id: &str,
) -> AppResult<sensors::Model> {
    let sensor = sensors::Entity::find_by_id(sensor_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sensor '{sensor_id}' not found")))?;

    if !owns_sensor(db, user, sensor_id).await? {
        return Err(AppError::Authorization(format!(
            "Sensor '{sensor_id}' belongs to another user"
        )));
    }
    Ok(sensor)
}

/// Plants visible to `user`, newest first.
pub async fn plants_for<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
) -> AppResult<Vec<plants::Model>> {
    let mut query = plants::Entity::find();
    if !user.is_staff {
        query = query.filter(plants::Column::OwnerId.eq(user.id));
    }
    Ok(query
        .order_by_desc(plants::Column::CreatedAt)
        .order_by_asc(plants::Column::Name)
        .all(db)
        .await?)
}

/// Sensors currently installed at one of the user's plants, or every sensor for staff.
pub async fn visible_sensors<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
) -> AppResult<Vec<sensors::Model>> {
    let mut query = sensors::Entity::find();
    if !user.is_staff {
        query = query
            .inner_join(installations::Entity)
            .join(JoinType::InnerJoin, installations::Relation::Plant.def())
            .filter(installations::Column::EndedAt.is_null())
            .filter(plants::Column::OwnerId.eq(user.id))
            .distinct();
    }
    Ok(query
        .order_by_asc(sensors::Column::CreatedAt)
        .order_by_asc(sensors::Column::Id)
        .all(db)
        .await?)
}
