use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Telemetry payload exactly as received. Never updated after insert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "raw_strings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub payload: String,
    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::readings::Entity")]
    Reading,
    #[sea_orm(has_one = "super::faults::Entity")]
    Fault,
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reading.def()
    }
}

impl Related<super::faults::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fault.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
