use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One handover of packed orders to a delivery courier. The orders in the
/// batch are linked through `delivery_record_orders`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub delivery_company: String,
    pub courier_name: String,
    pub courier_phone: String,
    pub assigned_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delivery_record_order::Entity")]
    Orders,
}

impl Related<super::delivery_record_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
