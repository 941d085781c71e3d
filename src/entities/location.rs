use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A storage slot inside a warehouse, addressed by aisle/rack/level and a
/// scanner barcode. `capacity` is a ceiling in volumetric units
/// (unit quantity x product size). The single location flagged
/// `is_staging_area` is the docking area where received goods wait for
/// put-away; it is resolved by query, never by a well-known id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub warehouse_id: i64,
    pub name: String,
    pub aisle: String,
    pub rack: String,
    pub level: String,
    #[sea_orm(unique)]
    pub barcode: String,
    pub capacity: i32,
    pub is_staging_area: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
