use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sensors")]
pub struct Model {
    /// Physical device code, supplied by the caller
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub type_id: i32,
    pub brand_id: i32,
    /// Compared verbatim against the digit run of incoming telemetry
    pub fault_code: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sensor_types::Entity",
        from = "Column::TypeId",
        to = "super::sensor_types::Column::Id",
        on_delete = "Restrict"
    )]
    SensorType,
    #[sea_orm(
        belongs_to = "super::sensor_brands::Entity",
        from = "Column::BrandId",
        to = "super::sensor_brands::Column::Id",
        on_delete = "Restrict"
    )]
    SensorBrand,
    #[sea_orm(has_many = "super::installations::Entity")]
    Installations,
    #[sea_orm(has_many = "super::readings::Entity")]
    Readings,
    #[sea_orm(has_many = "super::faults::Entity")]
    Faults,
}

impl Related<super::sensor_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorType.def()
    }
}

impl Related<super::sensor_brands::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorBrand.def()
    }
}

impl Related<super::installations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installations.def()
    }
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl Related<super::faults::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
