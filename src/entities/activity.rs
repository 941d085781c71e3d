use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "put_away")]
    PutAway,
    #[sea_orm(string_value = "pick")]
    Pick,
    #[sea_orm(string_value = "pack")]
    Pack,
    #[sea_orm(string_value = "delivery")]
    Delivery,
    #[sea_orm(string_value = "receive")]
    Receive,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    #[sea_orm(string_value = "cycle_count")]
    CycleCount,
    #[sea_orm(string_value = "replenishment")]
    Replenishment,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Human-readable audit trail of staff actions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub staff_id: i64,
    pub description: String,
    pub activity_type: ActivityType,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
