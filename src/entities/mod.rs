//! Database entities for the warehouse core.
//!
//! Mutable state lives in `inventory`, `wallet` and the status columns of
//! orders and shipments; everything under the "ledger" group is
//! append-only audit data.

pub mod activity;
pub mod barcode_scan;
pub mod category;
pub mod cycle_count;
pub mod delivery_record;
pub mod delivery_record_order;
pub mod inventory;
pub mod location;
pub mod notification;
pub mod order;
pub mod order_detail;
pub mod product;
pub mod replenishment_request;
pub mod shipment;
pub mod shipment_detail;
pub mod stock_adjustment;
pub mod stock_movement;
pub mod supplier;
pub mod transaction_log;
pub mod wallet;
pub mod warehouse;

pub use activity::ActivityType;
pub use barcode_scan::ScanAction;
pub use inventory::InventoryStatus;
pub use notification::NotificationStatus;
pub use order::{OrderPriority, OrderStatus};
pub use replenishment_request::ReplenishmentStatus;
pub use shipment::ShipmentStatus;
pub use stock_adjustment::AdjustmentType;
pub use stock_movement::MovementType;
pub use transaction_log::TransactionType;
