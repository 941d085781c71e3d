//! Shared quantity-store primitives used by the fulfillment services.
//!
//! Every helper takes a `ConnectionTrait` so it can run inside the caller's
//! transaction; none of them commit anything on their own. Invariants
//! maintained here: quantity never goes negative (validated against the
//! aggregate before any write) and rows that reach zero are deleted in the
//! same transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

use crate::{
    entities::{
        activity, barcode_scan, inventory, location, product, stock_adjustment, stock_movement,
        ActivityType, AdjustmentType, InventoryStatus, MovementType, ScanAction,
    },
    errors::ServiceError,
};

/// Resolves the designated staging (docking) area. Exactly one location is
/// expected to carry the flag; a missing one is a deployment error, not a
/// caller error.
pub(crate) async fn staging_area<C: ConnectionTrait>(
    db: &C,
) -> Result<location::Model, ServiceError> {
    location::Entity::find()
        .filter(location::Column::IsStagingArea.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::InternalError("no staging area location is configured".to_string())
        })
}

/// Total on-hand quantity of a product across all locations.
pub(crate) async fn on_hand_total<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
) -> Result<i64, ServiceError> {
    let rows = inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    Ok(rows.iter().map(|r| r.quantity as i64).sum())
}

/// Volumetric units already committed at a location:
/// sum(quantity x product size).
pub(crate) async fn used_capacity<C: ConnectionTrait>(
    db: &C,
    location_id: i64,
) -> Result<Decimal, ServiceError> {
    let rows = inventory::Entity::find()
        .filter(inventory::Column::LocationId.eq(location_id))
        .all(db)
        .await?;
    if rows.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let product_ids: Vec<i64> = rows.iter().map(|r| r.product_id).collect();
    let sizes: HashMap<i64, Decimal> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.size))
        .collect();

    Ok(rows
        .iter()
        .map(|r| Decimal::from(r.quantity) * sizes.get(&r.product_id).copied().unwrap_or_default())
        .sum())
}

/// Removes `quantity` units of a product from a location, draining
/// fragmented rows oldest-first and deleting any row that reaches zero.
///
/// A location with no record at all is `NotFound`; an existing balance
/// that is short is `InsufficientQuantity`. The aggregate is checked
/// before the first write, so a short location fails with no partial
/// effect.
pub(crate) async fn consume<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    location_id: i64,
    quantity: i32,
) -> Result<(), ServiceError> {
    let rows = inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .filter(inventory::Column::LocationId.eq(location_id))
        .order_by_asc(inventory::Column::Id)
        .all(db)
        .await?;

    if rows.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "no inventory record for product {} at location {}",
            product_id, location_id
        )));
    }

    let available: i64 = rows.iter().map(|r| r.quantity as i64).sum();
    if available < quantity as i64 {
        return Err(ServiceError::InsufficientQuantity(format!(
            "requested {} of product {} at location {}, only {} on hand",
            quantity, product_id, location_id, available
        )));
    }

    let mut remaining = quantity;
    for row in rows {
        if remaining == 0 {
            break;
        }
        let take = row.quantity.min(remaining);
        if take == row.quantity {
            inventory::Entity::delete_by_id(row.id).exec(db).await?;
        } else {
            let new_quantity = row.quantity - take;
            let mut active: inventory::ActiveModel = row.into();
            active.quantity = Set(new_quantity);
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
        }
        remaining -= take;
    }

    Ok(())
}

/// Adds `quantity` units of a product at a location, merging into the
/// oldest existing row or creating one. Destinations other than the
/// staging area keep a single logical balance through this path.
pub(crate) async fn deposit<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    location_id: i64,
    quantity: i32,
) -> Result<(), ServiceError> {
    let existing = inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .filter(inventory::Column::LocationId.eq(location_id))
        .order_by_asc(inventory::Column::Id)
        .one(db)
        .await?;

    match existing {
        Some(row) => {
            let new_quantity = row.quantity + quantity;
            let mut active: inventory::ActiveModel = row.into();
            active.quantity = Set(new_quantity);
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
        }
        None => {
            append_row(db, product_id, location_id, quantity).await?;
        }
    }

    Ok(())
}

/// Inserts a fresh inventory row. Used directly by receiving, which keeps
/// one row per receipt at the staging area.
pub(crate) async fn append_row<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    location_id: i64,
    quantity: i32,
) -> Result<inventory::Model, ServiceError> {
    let now = Utc::now();
    let row = inventory::ActiveModel {
        product_id: Set(product_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        status: Set(InventoryStatus::Available),
        expiry_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(row.insert(db).await?)
}

// Ledger-record helpers. All append-only, stamped with actor + timestamp,
// and inserted in the caller's transaction.

pub(crate) async fn record_movement<C: ConnectionTrait>(
    db: &C,
    staff_id: i64,
    product_id: i64,
    from_location_id: Option<i64>,
    to_location_id: Option<i64>,
    quantity: i32,
    movement_type: MovementType,
) -> Result<(), ServiceError> {
    stock_movement::ActiveModel {
        product_id: Set(product_id),
        from_location_id: Set(from_location_id),
        to_location_id: Set(to_location_id),
        quantity: Set(quantity),
        movement_type: Set(movement_type),
        staff_id: Set(staff_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub(crate) async fn record_adjustment<C: ConnectionTrait>(
    db: &C,
    staff_id: i64,
    product_id: i64,
    location_id: i64,
    quantity: i32,
    adjustment_type: AdjustmentType,
    reason: &str,
) -> Result<(), ServiceError> {
    stock_adjustment::ActiveModel {
        product_id: Set(product_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        adjustment_type: Set(adjustment_type),
        reason: Set(reason.to_string()),
        staff_id: Set(staff_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub(crate) async fn record_scan<C: ConnectionTrait>(
    db: &C,
    staff_id: i64,
    product_id: i64,
    location_id: i64,
    action: ScanAction,
) -> Result<(), ServiceError> {
    barcode_scan::ActiveModel {
        staff_id: Set(staff_id),
        product_id: Set(product_id),
        location_id: Set(location_id),
        action: Set(action),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub(crate) async fn record_activity<C: ConnectionTrait>(
    db: &C,
    staff_id: i64,
    activity_type: ActivityType,
    description: String,
) -> Result<(), ServiceError> {
    activity::ActiveModel {
        staff_id: Set(staff_id),
        description: Set(description),
        activity_type: Set(activity_type),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}
