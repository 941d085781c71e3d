use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        delivery_record, delivery_record_order, inventory, location, order, order_detail,
        ActivityType, AdjustmentType, InventoryStatus, MovementType, OrderStatus, ScanAction,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, notifications::NotificationService, stock},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct PickLocation {
    pub location_id: i64,
    pub name: String,
    pub aisle: String,
    pub rack: String,
    pub level: String,
    pub barcode: String,
    pub quantity: i64,
    /// volumetric units still free at the location
    pub capacity_left: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PickList {
    pub order_detail_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub locations: Vec<PickLocation>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AssignDeliveryRequest {
    #[validate(length(min = 1, message = "Delivery company is required"))]
    pub delivery_company: String,
    #[validate(length(min = 1, message = "Courier name is required"))]
    pub courier_name: String,
    #[validate(length(min = 1, message = "Courier phone is required"))]
    pub courier_phone: String,
    #[validate(length(min = 1, message = "At least one order is required"))]
    pub order_ids: Vec<i64>,
}

/// Outbound fulfillment: pick-list suggestions, picking of order lines,
/// packing and the final handover to a delivery courier.
#[derive(Clone)]
pub struct PickingService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    notifications: NotificationService,
}

impl PickingService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            notifications,
        }
    }

    /// Suggests up to three locations to pick an order line from, tightest
    /// remaining capacity first so nearly-full slots are emptied early.
    /// Read-only.
    #[instrument(skip(self))]
    pub async fn pick_list(&self, order_detail_id: i64) -> Result<PickList, ServiceError> {
        let db = self.db_pool.as_ref();

        let detail = order_detail::Entity::find_by_id(order_detail_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order detail {}", order_detail_id)))?;

        let product = catalog::product_by_id(db, detail.product_id).await?;

        let rows = inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product.id))
            .filter(inventory::Column::Status.eq(InventoryStatus::Available))
            .filter(inventory::Column::Quantity.gt(0))
            .all(db)
            .await?;

        // Aggregate fragments per location before ranking.
        let mut per_location: BTreeMap<i64, i64> = BTreeMap::new();
        for row in &rows {
            *per_location.entry(row.location_id).or_default() += row.quantity as i64;
        }

        let mut candidates = Vec::with_capacity(per_location.len());
        for (location_id, quantity) in per_location {
            let loc = location::Entity::find_by_id(location_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("location {}", location_id)))?;
            let capacity_left =
                Decimal::from(loc.capacity) - stock::used_capacity(db, location_id).await?;
            candidates.push(PickLocation {
                location_id,
                name: loc.name,
                aisle: loc.aisle,
                rack: loc.rack,
                level: loc.level,
                barcode: loc.barcode,
                quantity,
                capacity_left,
            });
        }

        if candidates.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "no available locations hold product {}",
                product.name
            )));
        }

        candidates.sort_by_key(|c| c.capacity_left);
        candidates.truncate(3);

        Ok(PickList {
            order_detail_id,
            product_id: product.id,
            product_name: product.name,
            quantity: detail.quantity,
            locations: candidates,
        })
    }

    /// Picks one order line from the chosen location. The full line
    /// quantity must be available there; picking never auto-splits across
    /// locations. When the last line of the order is picked the order
    /// escalates to `picked` and the customer is notified.
    #[instrument(skip(self), fields(order_detail_id = %order_detail_id, location = %location_barcode))]
    pub async fn pick(
        &self,
        staff_id: i64,
        order_detail_id: i64,
        location_barcode: &str,
    ) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();

        let detail = order_detail::Entity::find_by_id(order_detail_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order detail {}", order_detail_id)))?;

        if detail.status != OrderStatus::Pending {
            return Err(ServiceError::AlreadyProcessed(format!(
                "order line {} is {}, not pending",
                detail.id, detail.status
            )));
        }

        let order_row = order::Entity::find_by_id(detail.order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", detail.order_id)))?;

        if order_row.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStateTransition(format!(
                "order {} is {}, lines can only be picked while pending",
                order_row.id, order_row.status
            )));
        }

        let location = catalog::location_by_barcode(db, location_barcode).await?;
        let product = catalog::product_by_id(db, detail.product_id).await?;

        let order_id = order_row.id;
        let customer_id = order_row.customer_id;
        let product_id = product.id;
        let product_name = product.name.clone();
        let location_id = location.id;
        let location_name = location.name.clone();
        let quantity = detail.quantity;
        let detail_id = detail.id;

        let order_picked = db
            .transaction::<_, bool, ServiceError>(move |txn| {
                Box::pin(async move {
                    stock::consume(txn, product_id, location_id, quantity).await?;

                    stock::record_movement(
                        txn,
                        staff_id,
                        product_id,
                        Some(location_id),
                        None,
                        quantity,
                        MovementType::Pick,
                    )
                    .await?;
                    stock::record_adjustment(
                        txn,
                        staff_id,
                        product_id,
                        location_id,
                        quantity,
                        AdjustmentType::Decrease,
                        "Order picking",
                    )
                    .await?;
                    stock::record_scan(txn, staff_id, product_id, location_id, ScanAction::Pick)
                        .await?;
                    stock::record_activity(
                        txn,
                        staff_id,
                        ActivityType::Pick,
                        format!(
                            "Picked {} of {} from {}",
                            quantity, product_name, location_name
                        ),
                    )
                    .await?;

                    let mut line: order_detail::ActiveModel = detail.into();
                    line.status = Set(OrderStatus::Picked);
                    line.update(txn).await?;

                    let unpicked = order_detail::Entity::find()
                        .filter(order_detail::Column::OrderId.eq(order_id))
                        .filter(order_detail::Column::Status.ne(OrderStatus::Picked))
                        .all(txn)
                        .await?;

                    if unpicked.is_empty()
                        && order_row.status.can_transition_to(OrderStatus::Picked)
                    {
                        let mut active: order::ActiveModel = order_row.into();
                        active.status = Set(OrderStatus::Picked);
                        active.updated_at = Set(Utc::now());
                        active.update(txn).await?;
                        return Ok(true);
                    }

                    Ok(false)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(order_detail_id = detail_id, order_id, quantity, "order line picked");

        if let Err(e) = self
            .event_sender
            .send(Event::OrderLinePicked {
                order_id,
                order_detail_id: detail_id,
            })
            .await
        {
            warn!(error = %e, "failed to publish order line picked event");
        }

        if order_picked {
            if let Err(e) = self.event_sender.send(Event::OrderPicked(order_id)).await {
                warn!(error = %e, "failed to publish order picked event");
            }
            self.notifications
                .notify(customer_id, format!("Your order {} has been picked.", order_id))
                .await;
        }

        Ok(())
    }

    /// Marks a fully picked order as packed. No inventory moves here; the
    /// stock already left its locations at pick time.
    #[instrument(skip(self))]
    pub async fn pack(&self, staff_id: i64, order_id: i64) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();

        let order_row = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        if !order_row.status.can_transition_to(OrderStatus::Packed) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "order {} is {}, only picked orders can be packed",
                order_id, order_row.status
            )));
        }

        let customer_id = order_row.customer_id;

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                let mut active: order::ActiveModel = order_row.into();
                active.status = Set(OrderStatus::Packed);
                active.updated_at = Set(Utc::now());
                active.update(txn).await?;

                stock::record_activity(
                    txn,
                    staff_id,
                    ActivityType::Pack,
                    format!("Packed order {}", order_id),
                )
                .await?;

                Ok(())
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })?;

        if let Err(e) = self.event_sender.send(Event::OrderPacked(order_id)).await {
            warn!(error = %e, "failed to publish order packed event");
        }
        self.notifications
            .notify(customer_id, format!("Your order {} has been packed.", order_id))
            .await;

        Ok(())
    }

    /// Hands a batch of packed orders to a courier. Every order must be
    /// packed; one bad order aborts the whole batch with no partial
    /// effect. Creates a single delivery record linking all orders.
    #[instrument(skip(self, request), fields(orders = ?request.order_ids))]
    pub async fn assign_to_delivery(
        &self,
        staff_id: i64,
        request: AssignDeliveryRequest,
    ) -> Result<delivery_record::Model, ServiceError> {
        request.validate()?;

        let db = self.db_pool.as_ref();
        let order_ids = request.order_ids.clone();

        let (record, delivered) = db
            .transaction::<_, (delivery_record::Model, Vec<(i64, i64)>), ServiceError>(move |txn| {
                Box::pin(async move {
                    let orders = order::Entity::find()
                        .filter(order::Column::Id.is_in(request.order_ids.clone()))
                        .order_by_asc(order::Column::Id)
                        .all(txn)
                        .await?;

                    if orders.len() != request.order_ids.len() {
                        return Err(ServiceError::NotFound(
                            "one or more orders do not exist".to_string(),
                        ));
                    }

                    for order_row in &orders {
                        if order_row.status == OrderStatus::Cancelled {
                            return Err(ServiceError::InvalidStateTransition(format!(
                                "order {} has been cancelled",
                                order_row.id
                            )));
                        }
                        if !order_row.status.can_transition_to(OrderStatus::Delivered) {
                            return Err(ServiceError::InvalidStateTransition(format!(
                                "order {} is {}, only packed orders can be delivered",
                                order_row.id, order_row.status
                            )));
                        }
                    }

                    let now = Utc::now();
                    let record = delivery_record::ActiveModel {
                        delivery_company: Set(request.delivery_company.clone()),
                        courier_name: Set(request.courier_name.clone()),
                        courier_phone: Set(request.courier_phone.clone()),
                        assigned_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let mut delivered = Vec::with_capacity(orders.len());
                    let mut id_list = Vec::with_capacity(orders.len());
                    for order_row in orders {
                        delivered.push((order_row.id, order_row.customer_id));
                        id_list.push(order_row.id.to_string());

                        delivery_record_order::ActiveModel {
                            delivery_record_id: Set(record.id),
                            order_id: Set(order_row.id),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;

                        let mut active: order::ActiveModel = order_row.into();
                        active.status = Set(OrderStatus::Delivered);
                        active.delivered_at = Set(Some(now));
                        active.updated_at = Set(now);
                        active.update(txn).await?;
                    }

                    stock::record_activity(
                        txn,
                        staff_id,
                        ActivityType::Delivery,
                        format!(
                            "Orders {} delivered by {} from {}",
                            id_list.join(", "),
                            request.courier_name,
                            request.delivery_company
                        ),
                    )
                    .await?;

                    Ok((record, delivered))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::OrdersDelivered(order_ids.clone()))
            .await
        {
            warn!(error = %e, "failed to publish orders delivered event");
        }

        for (order_id, customer_id) in &delivered {
            self.notifications
                .notify(
                    *customer_id,
                    format!("Your order {} has been delivered.", order_id),
                )
                .await;
        }

        Ok(record)
    }
}
