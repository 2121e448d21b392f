use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::{
    faults, installations, plants, raw_strings, readings, sensor_brands, sensor_types, sensors,
    users,
};
use crate::error::{AppError, AppResult};
use crate::services::tracker;

const MAX_SENSOR_ID_LEN: usize = 30;
const MAX_FAULT_CODE_LEN: usize = 30;
const MAX_LOOKUP_NAME_LEN: usize = 30;
const MAX_PLANT_NAME_LEN: usize = 50;
const MAX_CITY_LEN: usize = 30;
const MAX_ADDRESS_LEN: usize = 100;

fn require_text(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be blank")));
    }
    check_len(field, value, max)
}

fn check_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

// ========== SENSOR TYPES / BRANDS ==========

pub async fn list_sensor_types<C: ConnectionTrait>(db: &C) -> AppResult<Vec<sensor_types::Model>> {
    Ok(sensor_types::Entity::find()
        .order_by_asc(sensor_types::Column::Id)
        .all(db)
        .await?)
}

/// # Errors
///
/// Returns `AppError::DuplicateKey` if a type with the same name exists.
pub async fn create_sensor_type<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> AppResult<sensor_types::Model> {
    let name = name.trim();
    require_text("name", name, MAX_LOOKUP_NAME_LEN)?;

    let exists = sensor_types::Entity::find()
        .filter(sensor_types::Column::Name.eq(name))
        .count(db)
        .await?;
    if exists > 0 {
        return Err(AppError::DuplicateKey(format!("Sensor type '{name}' already exists")));
    }

    Ok(sensor_types::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// # Errors
///
/// Returns `AppError::ReferentialIntegrity` while any sensor still uses the type.
pub async fn delete_sensor_type<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    let sensor_type = sensor_types::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sensor type {id} not found")))?;

    let in_use = sensors::Entity::find()
        .filter(sensors::Column::TypeId.eq(id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(AppError::ReferentialIntegrity(format!(
            "Sensor type '{}' is used by {in_use} sensor(s)",
            sensor_type.name
        )));
    }

    sensor_types::Entity::delete_by_id(id).exec(db).await?;
    tracing::info!(id, name = %sensor_type.name, "Sensor type deleted");
    Ok(())
}

pub async fn list_sensor_brands<C: ConnectionTrait>(
    db: &C,
) -> AppResult<Vec<sensor_brands::Model>> {
    Ok(sensor_brands::Entity::find()
        .order_by_asc(sensor_brands::Column::Id)
        .all(db)
        .await?)
}

/// # Errors
///
/// Returns `AppError::DuplicateKey` if a brand with the same name exists.
pub async fn create_sensor_brand<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> AppResult<sensor_brands::Model> {
    let name = name.trim();
    require_text("name", name, MAX_LOOKUP_NAME_LEN)?;

    let exists = sensor_brands::Entity::find()
        .filter(sensor_brands::Column::Name.eq(name))
        .count(db)
        .await?;
    if exists > 0 {
        return Err(AppError::DuplicateKey(format!("Sensor brand '{name}' already exists")));
    }

    Ok(sensor_brands::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// # Errors
///
/// Returns `AppError::ReferentialIntegrity` while any sensor still uses the brand.
pub async fn delete_sensor_brand<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    let brand = sensor_brands::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sensor brand {id} not found")))?;

    let in_use = sensors::Entity::find()
        .filter(sensors::Column::BrandId.eq(id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(AppError::ReferentialIntegrity(format!(
            "Sensor brand '{}' is used by {in_use} sensor(s)",
            brand.name
        )));
    }

    sensor_brands::Entity::delete_by_id(id).exec(db).await?;
    tracing::info!(id, name = %brand.name, "Sensor brand deleted");
    Ok(())
}

// ========== SENSORS ==========

#[derive(Debug, Clone)]
pub struct NewSensor {
    pub id: String,
    pub type_id: i32,
    pub brand_id: i32,
    pub fault_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct SensorChanges {
    pub type_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub fault_code: Option<String>,
}

/// A sensor with its lookup names resolved.
#[derive(Debug, Clone)]
pub struct SensorView {
    pub sensor: sensors::Model,
    pub type_name: String,
    pub brand_name: String,
}

async fn check_lookups<C: ConnectionTrait>(
    db: &C,
    type_id: Option<i32>,
    brand_id: Option<i32>,
) -> AppResult<()> {
    if let Some(type_id) = type_id
        && sensor_types::Entity::find_by_id(type_id).one(db).await?.is_none()
    {
        return Err(AppError::NotFound(format!("Sensor type {type_id} not found")));
    }
    if let Some(brand_id) = brand_id
        && sensor_brands::Entity::find_by_id(brand_id).one(db).await?.is_none()
    {
        return Err(AppError::NotFound(format!("Sensor brand {brand_id} not found")));
    }
    Ok(())
}

pub async fn get_sensor<C: ConnectionTrait>(db: &C, id: &str) -> AppResult<sensors::Model> {
    sensors::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sensor '{id}' not found")))
}

pub async fn list_sensors<C: ConnectionTrait>(db: &C) -> AppResult<Vec<sensors::Model>> {
    Ok(sensors::Entity::find()
        .order_by_asc(sensors::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Register a sensor, optionally installing it at a plant in the same transaction.
///
/// # Errors
///
/// - `AppError::BadRequest` for a blank or oversized id / fault code, or an
///   id containing whitespace (it could never be decoded)
/// - `AppError::DuplicateKey` if the id is taken
/// - `AppError::NotFound` if the type, brand or plant does not exist
pub async fn create_sensor<C>(
    db: &C,
    new: NewSensor,
    install_at: Option<Uuid>,
    now: DateTime<Utc>,
) -> AppResult<sensors::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    require_text("id", &new.id, MAX_SENSOR_ID_LEN)?;
    if new.id.chars().any(char::is_whitespace) {
        return Err(AppError::BadRequest("id must not contain whitespace".to_string()));
    }
    require_text("fault_code", &new.fault_code, MAX_FAULT_CODE_LEN)?;

    let txn = db.begin().await?;

    if sensors::Entity::find_by_id(new.id.clone())
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateKey(format!(
            "Sensor '{}' already exists",
            new.id
        )));
    }
    check_lookups(&txn, Some(new.type_id), Some(new.brand_id)).await?;

    let sensor = sensors::ActiveModel {
        id: Set(new.id),
        type_id: Set(new.type_id),
        brand_id: Set(new.brand_id),
        fault_code: Set(new.fault_code),
        created_at: Set(now.fixed_offset()),
    }
    .insert(&txn)
    .await?;

    if let Some(plant_id) = install_at {
        tracker::attach(&txn, &sensor.id, plant_id, now).await?;
    }

    txn.commit().await?;

    tracing::info!(sensor_id = %sensor.id, "Sensor registered");
    Ok(sensor)
}

pub async fn update_sensor<C: ConnectionTrait>(
    db: &C,
    id: &str,
    changes: SensorChanges,
) -> AppResult<sensors::Model> {
    let sensor = get_sensor(db, id).await?;
    check_lookups(db, changes.type_id, changes.brand_id).await?;

    let mut active: sensors::ActiveModel = sensor.into();
    if let Some(type_id) = changes.type_id {
        active.type_id = Set(type_id);
    }
    if let Some(brand_id) = changes.brand_id {
        active.brand_id = Set(brand_id);
    }
    if let Some(fault_code) = changes.fault_code {
        require_text("fault_code", &fault_code, MAX_FAULT_CODE_LEN)?;
        active.fault_code = Set(fault_code);
    }

    Ok(active.update(db).await?)
}

/// Physically remove a sensor with its installations and telemetry.
///
/// Raw strings whose reading or fault belongs to the sensor are removed too,
/// so no raw string is left without its decoded row.
pub async fn delete_sensor<C>(db: &C, id: &str) -> AppResult<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let sensor = get_sensor(&txn, id).await?;

    let mut raw_ids: Vec<i32> = readings::Entity::find()
        .select_only()
        .column(readings::Column::RawStringId)
        .filter(readings::Column::SensorId.eq(sensor.id.as_str()))
        .into_tuple()
        .all(&txn)
        .await?;
    let fault_raw_ids: Vec<i32> = faults::Entity::find()
        .select_only()
        .column(faults::Column::RawStringId)
        .filter(faults::Column::SensorId.eq(sensor.id.as_str()))
        .into_tuple()
        .all(&txn)
        .await?;
    raw_ids.extend(fault_raw_ids);

    readings::Entity::delete_many()
        .filter(readings::Column::SensorId.eq(sensor.id.as_str()))
        .exec(&txn)
        .await?;
    faults::Entity::delete_many()
        .filter(faults::Column::SensorId.eq(sensor.id.as_str()))
        .exec(&txn)
        .await?;
    for chunk in raw_ids.chunks(500) {
        raw_strings::Entity::delete_many()
            .filter(raw_strings::Column::Id.is_in(chunk.iter().copied()))
            .exec(&txn)
            .await?;
    }
    installations::Entity::delete_many()
        .filter(installations::Column::SensorId.eq(sensor.id.as_str()))
        .exec(&txn)
        .await?;
    sensors::Entity::delete_by_id(sensor.id.clone())
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(sensor_id = %sensor.id, raw_strings = raw_ids.len(), "Sensor deleted");
    Ok(())
}

/// Resolve type and brand names for a batch of sensors.
pub async fn describe_sensors<C: ConnectionTrait>(
    db: &C,
    sensors_list: Vec<sensors::Model>,
) -> AppResult<Vec<SensorView>> {
    let type_names: HashMap<i32, String> = list_sensor_types(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();
    let brand_names: HashMap<i32, String> = list_sensor_brands(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect();

    Ok(sensors_list
        .into_iter()
        .map(|sensor| SensorView {
            type_name: type_names.get(&sensor.type_id).cloned().unwrap_or_default(),
            brand_name: brand_names.get(&sensor.brand_id).cloned().unwrap_or_default(),
            sensor,
        })
        .collect())
}

pub async fn describe_sensor<C: ConnectionTrait>(
    db: &C,
    sensor: sensors::Model,
) -> AppResult<SensorView> {
    describe_sensors(db, vec![sensor])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("sensor description missing".to_string()))
}

// ========== PLANTS ==========

#[derive(Debug, Clone)]
pub struct PlantDraft {
    pub name: String,
    pub city: String,
    pub address: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct PlantChanges {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

async fn require_user<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

pub async fn get_plant<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<plants::Model> {
    plants::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plant {id} not found")))
}

pub async fn create_plant<C: ConnectionTrait>(
    db: &C,
    draft: PlantDraft,
    now: DateTime<Utc>,
) -> AppResult<plants::Model> {
    require_text("name", &draft.name, MAX_PLANT_NAME_LEN)?;
    require_text("city", &draft.city, MAX_CITY_LEN)?;
    check_len("address", &draft.address, MAX_ADDRESS_LEN)?;
    require_user(db, draft.owner_id).await?;

    let plant = plants::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(draft.name),
        city: Set(draft.city),
        address: Set(draft.address),
        owner_id: Set(draft.owner_id),
        created_at: Set(now.fixed_offset()),
    }
    .insert(db)
    .await?;

    tracing::info!(plant_id = %plant.id, name = %plant.name, "Plant created");
    Ok(plant)
}

pub async fn update_plant<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    changes: PlantChanges,
) -> AppResult<plants::Model> {
    let plant = get_plant(db, id).await?;
    let mut active: plants::ActiveModel = plant.into();

    if let Some(name) = changes.name {
        require_text("name", &name, MAX_PLANT_NAME_LEN)?;
        active.name = Set(name);
    }
    if let Some(city) = changes.city {
        require_text("city", &city, MAX_CITY_LEN)?;
        active.city = Set(city);
    }
    if let Some(address) = changes.address {
        check_len("address", &address, MAX_ADDRESS_LEN)?;
        active.address = Set(address);
    }
    if let Some(owner_id) = changes.owner_id {
        require_user(db, owner_id).await?;
        active.owner_id = Set(owner_id);
    }

    Ok(active.update(db).await?)
}

/// Delete a plant and its installation history. Sensors are kept.
pub async fn delete_plant<C>(db: &C, id: Uuid) -> AppResult<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let plant = get_plant(&txn, id).await?;

    installations::Entity::delete_many()
        .filter(installations::Column::PlantId.eq(plant.id))
        .exec(&txn)
        .await?;
    plants::Entity::delete_by_id(plant.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(plant_id = %id, "Plant deleted");
    Ok(())
}
