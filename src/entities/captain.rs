use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ride::VehicleClass;

/// Stored but not consulted by radius matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum CaptainStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "captain")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    #[serde(skip_serializing)]
    pub socket_id: Option<String>,
    pub status: CaptainStatus,
    pub vehicle_color: String,
    pub vehicle_plate: String,
    pub vehicle_capacity: i32,
    pub vehicle_type: VehicleClass,
    /// Last reported position; no timestamp is kept.
    pub location_ltd: Option<f64>,
    pub location_lng: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ride::Entity")]
    Rides,
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
