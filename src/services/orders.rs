use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        order, order_detail, transaction_log, wallet, OrderPriority, OrderStatus, TransactionType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, notifications::NotificationService, stock},
};

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter =
        IntCounter::new("order_creations_total", "Total number of orders created")
            .expect("metric can be created");
    static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "order_creation_failures_total",
        "Total number of failed order creations"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "At least one order line is required"))]
    pub lines: Vec<OrderLineInput>,
    pub priority: Option<OrderPriority>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, message = "At least one order line is required"))]
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderWithDetails {
    pub order: order::Model,
    pub details: Vec<order_detail::Model>,
}

/// Quantity of a product committed to pending orders other than
/// `exclude_order`. Reservations are implicit: a pending order line holds
/// its quantity against availability until picked or cancelled.
async fn committed_to_pending_orders<C: ConnectionTrait>(
    db: &C,
    product_id: i64,
    exclude_order: Option<i64>,
) -> Result<i64, ServiceError> {
    let mut pending = order::Entity::find().filter(order::Column::Status.eq(OrderStatus::Pending));
    if let Some(order_id) = exclude_order {
        pending = pending.filter(order::Column::Id.ne(order_id));
    }
    let order_ids: Vec<i64> = pending.all(db).await?.into_iter().map(|o| o.id).collect();
    if order_ids.is_empty() {
        return Ok(0);
    }

    let details = order_detail::Entity::find()
        .filter(order_detail::Column::OrderId.is_in(order_ids))
        .filter(order_detail::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    Ok(details.iter().map(|d| d.quantity as i64).sum())
}

fn positive_lines(lines: &[OrderLineInput]) -> Result<(), ServiceError> {
    if lines.iter().any(|line| line.quantity <= 0) {
        return Err(ServiceError::InvalidArgument(
            "order line quantity must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Order settlement: creation, update and cancellation, each tied to the
/// customer wallet. Wallet balance and transaction log move together in
/// one transaction, so the log always reconciles.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    notifications: NotificationService,
}

impl OrderService {
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

    /// Settles a new order: snapshots prices, verifies per-product
    /// availability net of other pending orders, verifies the wallet
    /// covers the total, then persists the order, debits the wallet and
    /// appends the purchase log entry. Any failed check aborts with no
    /// partial writes.
    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn create_order(
        &self,
        customer_id: i64,
        request: CreateOrderRequest,
    ) -> Result<OrderWithDetails, ServiceError> {
        request.validate().map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            ServiceError::ValidationError(e.to_string())
        })?;
        positive_lines(&request.lines).map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            e
        })?;

        let db = self.db_pool.as_ref();
        let priority = request.priority.unwrap_or(OrderPriority::Low);
        let lines = request.lines;

        let result = db
            .transaction::<_, OrderWithDetails, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Resolve products and compute the frozen total first.
                    let mut priced = Vec::with_capacity(lines.len());
                    let mut total = Decimal::ZERO;
                    for line in &lines {
                        let product = catalog::product_by_id(txn, line.product_id).await?;
                        total += product.price * Decimal::from(line.quantity);
                        priced.push((product, line.quantity));
                    }

                    // Availability: on-hand minus what other pending
                    // orders already reserve must cover this request.
                    for (product, quantity) in &priced {
                        let on_hand = stock::on_hand_total(txn, product.id).await?;
                        let reserved =
                            committed_to_pending_orders(txn, product.id, None).await?;
                        if on_hand - reserved - (*quantity as i64) < 0 {
                            return Err(ServiceError::InsufficientQuantity(format!(
                                "not enough quantity available for product {}",
                                product.name
                            )));
                        }
                    }

                    let wallet_row = wallet::Entity::find()
                        .filter(wallet::Column::CustomerId.eq(customer_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "wallet for customer {}",
                                customer_id
                            ))
                        })?;

                    if wallet_row.balance < total {
                        return Err(ServiceError::InsufficientFunds(format!(
                            "balance {} is below order total {}",
                            wallet_row.balance, total
                        )));
                    }

                    let now = Utc::now();
                    let order_row = order::ActiveModel {
                        customer_id: Set(customer_id),
                        total_price: Set(total),
                        status: Set(OrderStatus::Pending),
                        priority: Set(priority),
                        created_at: Set(now),
                        updated_at: Set(now),
                        delivered_at: Set(None),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let mut details = Vec::with_capacity(priced.len());
                    for (product, quantity) in priced {
                        let detail = order_detail::ActiveModel {
                            order_id: Set(order_row.id),
                            product_id: Set(product.id),
                            price_at_sale: Set(product.price),
                            quantity: Set(quantity),
                            status: Set(OrderStatus::Pending),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                        details.push(detail);
                    }

                    let new_balance = wallet_row.balance - total;
                    let mut wallet_active: wallet::ActiveModel = wallet_row.into();
                    wallet_active.balance = Set(new_balance);
                    wallet_active.updated_at = Set(now);
                    wallet_active.update(txn).await?;

                    transaction_log::ActiveModel {
                        customer_id: Set(customer_id),
                        amount: Set(total),
                        transaction_type: Set(TransactionType::Purchase),
                        description: Set(Some("Deducted funds for order".to_string())),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(OrderWithDetails {
                        order: order_row,
                        details,
                    })
                })
            })
            .await
            .map_err(|e| {
                ORDER_CREATION_FAILURES.inc();
                match e {
                    TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        ORDER_CREATIONS.inc();
        info!(
            order_id = result.order.id,
            total = %result.order.total_price,
            "order created"
        );

        if let Err(e) = self.event_sender.send(Event::OrderCreated(result.order.id)).await {
            warn!(error = %e, "failed to publish order created event");
        }
        self.notifications
            .notify_admin(format!("New order created: Order ID {}", result.order.id))
            .await;

        Ok(result)
    }

    /// Replaces the line set of a pending order. The wallet settles the
    /// difference against the prior total (further purchase or partial
    /// refund), and an increase re-runs the affordability check.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: i64,
        request: UpdateOrderRequest,
    ) -> Result<OrderWithDetails, ServiceError> {
        request.validate()?;
        positive_lines(&request.lines)?;

        let db = self.db_pool.as_ref();
        let lines = request.lines;

        let result = db
            .transaction::<_, OrderWithDetails, ServiceError>(move |txn| {
                Box::pin(async move {
                    let order_row = order::Entity::find_by_id(order_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

                    if order_row.status != OrderStatus::Pending {
                        return Err(ServiceError::InvalidStateTransition(format!(
                            "order {} is {}, only pending orders can be updated",
                            order_id, order_row.status
                        )));
                    }

                    let mut priced = Vec::with_capacity(lines.len());
                    let mut new_total = Decimal::ZERO;
                    for line in &lines {
                        let product = catalog::product_by_id(txn, line.product_id).await?;
                        new_total += product.price * Decimal::from(line.quantity);
                        priced.push((product, line.quantity));
                    }

                    // Availability excludes this order's own reservation.
                    for (product, quantity) in &priced {
                        let on_hand = stock::on_hand_total(txn, product.id).await?;
                        let reserved =
                            committed_to_pending_orders(txn, product.id, Some(order_id)).await?;
                        if on_hand - reserved - (*quantity as i64) < 0 {
                            return Err(ServiceError::InsufficientQuantity(format!(
                                "not enough quantity available for product {}",
                                product.name
                            )));
                        }
                    }

                    let prior_total = order_row.total_price;
                    let difference = new_total - prior_total;

                    let wallet_row = wallet::Entity::find()
                        .filter(wallet::Column::CustomerId.eq(order_row.customer_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "wallet for customer {}",
                                order_row.customer_id
                            ))
                        })?;

                    if difference > Decimal::ZERO && wallet_row.balance < difference {
                        return Err(ServiceError::InsufficientFunds(format!(
                            "balance {} cannot cover the additional {}",
                            wallet_row.balance, difference
                        )));
                    }

                    let now = Utc::now();
                    let customer_id = order_row.customer_id;

                    if difference != Decimal::ZERO {
                        let new_balance = wallet_row.balance - difference;
                        let mut wallet_active: wallet::ActiveModel = wallet_row.into();
                        wallet_active.balance = Set(new_balance);
                        wallet_active.updated_at = Set(now);
                        wallet_active.update(txn).await?;

                        let (log_type, amount) = if difference > Decimal::ZERO {
                            (TransactionType::Purchase, difference)
                        } else {
                            (TransactionType::Refund, -difference)
                        };
                        transaction_log::ActiveModel {
                            customer_id: Set(customer_id),
                            amount: Set(amount),
                            transaction_type: Set(log_type),
                            description: Set(Some("Updated funds for order".to_string())),
                            created_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                    }

                    order_detail::Entity::delete_many()
                        .filter(order_detail::Column::OrderId.eq(order_id))
                        .exec(txn)
                        .await?;

                    let mut details = Vec::with_capacity(priced.len());
                    for (product, quantity) in priced {
                        let detail = order_detail::ActiveModel {
                            order_id: Set(order_id),
                            product_id: Set(product.id),
                            price_at_sale: Set(product.price),
                            quantity: Set(quantity),
                            status: Set(OrderStatus::Pending),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                        details.push(detail);
                    }

                    let mut order_active: order::ActiveModel = order_row.into();
                    order_active.total_price = Set(new_total);
                    order_active.updated_at = Set(now);
                    let updated = order_active.update(txn).await?;

                    Ok(OrderWithDetails {
                        order: updated,
                        details,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self.event_sender.send(Event::OrderUpdated(order_id)).await {
            warn!(error = %e, "failed to publish order updated event");
        }
        self.notifications
            .notify_admin(format!("Order updated: Order ID {}", order_id))
            .await;

        Ok(result)
    }

    /// Cancels a pending order owned by the customer: refunds the full
    /// frozen total, appends the refund log entry and marks the order and
    /// its lines cancelled. Cancelled orders are terminal.
    #[instrument(skip(self), fields(order_id = %order_id, customer_id = %customer_id))]
    pub async fn cancel_order(
        &self,
        customer_id: i64,
        order_id: i64,
    ) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();

        let order_row = order::Entity::find_by_id(order_id)
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        if !order_row.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "order {} is {}, only pending orders can be cancelled",
                order_id, order_row.status
            )));
        }

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                let wallet_row = wallet::Entity::find()
                    .filter(wallet::Column::CustomerId.eq(customer_id))
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("wallet for customer {}", customer_id))
                    })?;

                let now = Utc::now();
                let refund = order_row.total_price;

                let new_balance = wallet_row.balance + refund;
                let mut wallet_active: wallet::ActiveModel = wallet_row.into();
                wallet_active.balance = Set(new_balance);
                wallet_active.updated_at = Set(now);
                wallet_active.update(txn).await?;

                transaction_log::ActiveModel {
                    customer_id: Set(customer_id),
                    amount: Set(refund),
                    transaction_type: Set(TransactionType::Refund),
                    description: Set(Some("Refunded funds for cancelled order".to_string())),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                let details = order_detail::Entity::find()
                    .filter(order_detail::Column::OrderId.eq(order_id))
                    .all(txn)
                    .await?;
                for detail in details {
                    let mut line: order_detail::ActiveModel = detail.into();
                    line.status = Set(OrderStatus::Cancelled);
                    line.update(txn).await?;
                }

                let mut order_active: order::ActiveModel = order_row.into();
                order_active.status = Set(OrderStatus::Cancelled);
                order_active.updated_at = Set(now);
                order_active.update(txn).await?;

                Ok(())
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })?;

        if let Err(e) = self.event_sender.send(Event::OrderCancelled(order_id)).await {
            warn!(error = %e, "failed to publish order cancelled event");
        }
        self.notifications
            .notify_admin(format!("Order cancelled: Order ID {}", order_id))
            .await;

        Ok(())
    }

    /// Walks the order through an explicit status transition, rejecting
    /// anything the transition table forbids. The customer is notified of
    /// the change.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i64,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let order_row = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        if !order_row.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "order {} cannot move from {} to {}",
                order_id, order_row.status, new_status
            )));
        }

        let customer_id = order_row.customer_id;
        let now = Utc::now();
        let mut active: order::ActiveModel = order_row.into();
        active.status = Set(new_status);
        active.updated_at = Set(now);
        if new_status == OrderStatus::Delivered {
            active.delivered_at = Set(Some(now));
        }
        let updated = active.update(db).await?;

        self.notifications
            .notify(
                customer_id,
                format!(
                    "Your order (ID: {}) status has been updated to {}.",
                    order_id, new_status
                ),
            )
            .await;

        Ok(updated)
    }

    /// Bumps an order to high priority.
    pub async fn prioritize(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let order_row = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        let mut active: order::ActiveModel = order_row.into();
        active.priority = Set(OrderPriority::High);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderWithDetails, ServiceError> {
        let db = self.db_pool.as_ref();

        let order_row = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {}", order_id)))?;

        let details = order_detail::Entity::find()
            .filter(order_detail::Column::OrderId.eq(order_id))
            .order_by_asc(order_detail::Column::Id)
            .all(db)
            .await?;

        Ok(OrderWithDetails {
            order: order_row,
            details,
        })
    }

    /// Work-queue ordering: pending orders first, high priority before
    /// low, newest first within each group.
    pub async fn list_orders(&self) -> Result<Vec<order::Model>, ServiceError> {
        let mut orders = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;

        orders.sort_by_key(|o| {
            let pending_rank = if o.status == OrderStatus::Pending { 0 } else { 1 };
            let priority_rank = match o.priority {
                OrderPriority::High => 0,
                OrderPriority::Low => 1,
            };
            (pending_rank, priority_rank)
        });

        Ok(orders)
    }

    pub async fn orders_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?)
    }
}
