use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an inbound shipment and of each of its detail lines.
///
/// The status is non-decreasing: pending -> received -> put_away. A
/// shipment header only advances when none of its lines lag behind.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "snake_case")]
pub enum ShipmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "put_away")]
    PutAway,
}

impl ShipmentStatus {
    /// Transition table: the shipment lifecycle only moves forward.
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        matches!(
            (self, next),
            (ShipmentStatus::Pending, ShipmentStatus::Received)
                | (ShipmentStatus::Received, ShipmentStatus::PutAway)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub supplier_id: i64,
    pub arrival_date: Date,
    /// Stamped when the last line leaves `pending` (header `received`) and
    /// refreshed when the last line is put away.
    pub receive_date: Option<DateTimeUtc>,
    pub status: ShipmentStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::shipment_detail::Entity")]
    Details,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::shipment_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipment_status_is_non_decreasing() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Received));
        assert!(ShipmentStatus::Received.can_transition_to(ShipmentStatus::PutAway));

        assert!(!ShipmentStatus::Received.can_transition_to(ShipmentStatus::Pending));
        assert!(!ShipmentStatus::PutAway.can_transition_to(ShipmentStatus::Received));
        assert!(!ShipmentStatus::PutAway.can_transition_to(ShipmentStatus::Pending));
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::PutAway));
    }
}
