//! Shared setup for integration tests: an in-memory SQLite database with the
//! full schema, and a small world of users, plants and sensors.

#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use plant_telemetry::common::AppState;
use plant_telemetry::config::Config;
use plant_telemetry::entity::{plants, sensors, users};
use plant_telemetry::services::{auth, registry};

pub const PASSWORD: &str = "correct horse";
pub const FAULT_CODE: &str = "999";

pub async fn setup_db() -> DatabaseConnection {
    // One connection, so every query sees the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory SQLite");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str, is_staff: bool) -> users::Model {
    let hash = auth::hash_password(PASSWORD, 4 /* bcrypt minimum cost */).expect("hash password");
    auth::create_user(
        db,
        username,
        hash,
        &token_for(username),
        is_staff,
        Utc::now(),
    )
    .await
    .expect("create user")
}

#[must_use]
pub fn token_for(username: &str) -> String {
    format!("{username}-token")
}

pub async fn create_plant(
    db: &DatabaseConnection,
    name: &str,
    owner: &users::Model,
) -> plants::Model {
    registry::create_plant(
        db,
        registry::PlantDraft {
            name: name.to_string(),
            city: "Milano".to_string(),
            address: "Via Roma 1".to_string(),
            owner_id: owner.id,
        },
        Utc::now(),
    )
    .await
    .expect("create plant")
}

pub struct World {
    pub db: DatabaseConnection,
    pub staff: users::Model,
    pub owner: users::Model,
    pub stranger: users::Model,
    /// Owned by `owner`
    pub plant_a: plants::Model,
    /// Owned by `stranger`
    pub plant_b: plants::Model,
    pub type_id: i32,
    pub brand_id: i32,
}

impl World {
    pub async fn new() -> Self {
        let db = setup_db().await;

        let staff = create_user(&db, "admin", true).await;
        let owner = create_user(&db, "mario", false).await;
        let stranger = create_user(&db, "luigi", false).await;

        let plant_a = create_plant(&db, "Impianto A", &owner).await;
        let plant_b = create_plant(&db, "Impianto B", &stranger).await;

        let sensor_type = registry::create_sensor_type(&db, "Temperatura")
            .await
            .expect("create type");
        let brand = registry::create_sensor_brand(&db, "Siemens")
            .await
            .expect("create brand");

        Self {
            db,
            staff,
            owner,
            stranger,
            plant_a,
            plant_b,
            type_id: sensor_type.id,
            brand_id: brand.id,
        }
    }

    /// Register a sensor with fault code `999`, optionally installed at a plant.
    pub async fn sensor(&self, id: &str, plant: Option<&plants::Model>) -> sensors::Model {
        self.sensor_with_type(id, plant, self.type_id).await
    }

    pub async fn sensor_with_type(
        &self,
        id: &str,
        plant: Option<&plants::Model>,
        type_id: i32,
    ) -> sensors::Model {
        registry::create_sensor(
            &self.db,
            registry::NewSensor {
                id: id.to_string(),
                type_id,
                brand_id: self.brand_id,
                fault_code: FAULT_CODE.to_string(),
            },
            plant.map(|p| p.id),
            Utc::now(),
        )
        .await
        .expect("create sensor")
    }

    /// Application state sharing this world's database, rate limiting off, UTC decoding.
    pub fn state(&self) -> AppState {
        AppState::new(self.db.clone(), Config::for_database("sqlite::memory:"))
    }
}
