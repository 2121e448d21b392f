use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Telemetry whose digit run matched the sensor's fault code.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "faults")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub raw_string_id: i32,
    pub sensor_id: String,
    pub message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::raw_strings::Entity",
        from = "Column::RawStringId",
        to = "super::raw_strings::Column::Id",
        on_delete = "Cascade"
    )]
    RawString,
    #[sea_orm(
        belongs_to = "super::sensors::Entity",
        from = "Column::SensorId",
        to = "super::sensors::Column::Id",
        on_delete = "Cascade"
    )]
    Sensor,
}

impl Related<super::raw_strings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawString.def()
    }
}

impl Related<super::sensors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
