use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join row linking a delivery record to one of its orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_record_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub delivery_record_id: i64,
    pub order_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_record::Entity",
        from = "Column::DeliveryRecordId",
        to = "super::delivery_record::Column::Id"
    )]
    DeliveryRecord,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::delivery_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryRecord.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
