use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        inventory, replenishment_request, ActivityType, AdjustmentType, MovementType,
        ReplenishmentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, stock},
};

lazy_static! {
    static ref STOCK_TRANSFERS: IntCounter = IntCounter::new(
        "stock_transfers_total",
        "Total number of stock transfers completed"
    )
    .expect("metric can be created");
    static ref CYCLE_COUNTS: IntCounter = IntCounter::new(
        "cycle_counts_total",
        "Total number of cycle counts recorded"
    )
    .expect("metric can be created");
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(length(min = 1, message = "Product barcode is required"))]
    pub product_barcode: String,
    #[validate(length(min = 1, message = "Source location barcode is required"))]
    pub from_location_barcode: String,
    #[validate(length(min = 1, message = "Destination location barcode is required"))]
    pub to_location_barcode: String,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CycleCountRequest {
    #[validate(length(min = 1, message = "Product barcode is required"))]
    pub product_barcode: String,
    #[validate(length(min = 1, message = "Location barcode is required"))]
    pub location_barcode: String,
    #[validate(range(min = 0, message = "Counted quantity must not be negative"))]
    pub counted_quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CycleCountResult {
    pub product_id: i64,
    pub location_id: i64,
    pub recorded_quantity: i64,
    pub counted_quantity: i32,
    /// counted minus recorded
    pub variance: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReplenishmentRequestInput {
    #[validate(length(min = 1, message = "Product barcode is required"))]
    pub product_barcode: String,
    #[validate(length(min = 1, message = "Location barcode is required"))]
    pub location_barcode: String,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
    pub reason: Option<String>,
}

/// Service owning direct inventory mutations: transfers between locations,
/// cycle-count reconciliation and replenishment requests.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Moves quantity of a product from one location to another. The
    /// decrement, increment and both ledger records commit atomically.
    #[instrument(skip(self, request), fields(product = %request.product_barcode, quantity = %request.quantity))]
    pub async fn transfer(
        &self,
        staff_id: i64,
        request: TransferRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        if request.from_location_barcode == request.to_location_barcode {
            return Err(ServiceError::InvalidArgument(
                "source and destination location cannot be the same".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let product = catalog::product_by_barcode(db, &request.product_barcode).await?;
        let from_location = catalog::location_by_barcode(db, &request.from_location_barcode).await?;
        let to_location = catalog::location_by_barcode(db, &request.to_location_barcode).await?;

        let quantity = request.quantity;
        let product_id = product.id;
        let product_name = product.name.clone();
        let from_id = from_location.id;
        let to_id = to_location.id;
        let from_name = from_location.name.clone();
        let to_name = to_location.name.clone();

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                stock::consume(txn, product_id, from_id, quantity).await?;
                stock::deposit(txn, product_id, to_id, quantity).await?;

                stock::record_movement(
                    txn,
                    staff_id,
                    product_id,
                    Some(from_id),
                    Some(to_id),
                    quantity,
                    MovementType::Transfer,
                )
                .await?;
                stock::record_activity(
                    txn,
                    staff_id,
                    ActivityType::Transfer,
                    format!(
                        "Transferred {} of {} from {} to {}",
                        quantity, product_name, from_name, to_name
                    ),
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

        STOCK_TRANSFERS.inc();
        info!(
            product_id,
            from_location_id = from_id,
            to_location_id = to_id,
            quantity,
            "stock transfer completed"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::StockTransferred {
                product_id,
                from_location_id: from_id,
                to_location_id: to_id,
                quantity,
            })
            .await
        {
            warn!(error = %e, "failed to publish stock transferred event");
        }

        Ok(())
    }

    /// Records a physical count and reconciles the stored balance to it.
    /// This is the only path that sets a quantity directly instead of
    /// applying a delta.
    #[instrument(skip(self, request), fields(product = %request.product_barcode, counted = %request.counted_quantity))]
    pub async fn cycle_count(
        &self,
        staff_id: i64,
        request: CycleCountRequest,
    ) -> Result<CycleCountResult, ServiceError> {
        request.validate()?;

        let db = self.db_pool.as_ref();
        let product = catalog::product_by_barcode(db, &request.product_barcode).await?;
        let location = catalog::location_by_barcode(db, &request.location_barcode).await?;

        let counted = request.counted_quantity;
        let product_id = product.id;
        let product_name = product.name.clone();
        let location_id = location.id;
        let location_name = location.name.clone();

        let result = db
            .transaction::<_, CycleCountResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let rows = inventory::Entity::find()
                        .filter(inventory::Column::ProductId.eq(product_id))
                        .filter(inventory::Column::LocationId.eq(location_id))
                        .order_by_asc(inventory::Column::Id)
                        .all(txn)
                        .await?;
                    if rows.is_empty() {
                        return Err(ServiceError::NotFound(format!(
                            "no inventory record for product {} at location {}",
                            product_id, location_id
                        )));
                    }

                    let recorded: i64 = rows.iter().map(|r| r.quantity as i64).sum();

                    crate::entities::cycle_count::ActiveModel {
                        product_id: Set(product_id),
                        location_id: Set(location_id),
                        counted_quantity: Set(counted),
                        staff_id: Set(staff_id),
                        created_at: Set(chrono::Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    stock::record_activity(
                        txn,
                        staff_id,
                        ActivityType::CycleCount,
                        format!(
                            "Cycle count for {} at {} - counted quantity: {}",
                            product_name, location_name, counted
                        ),
                    )
                    .await?;

                    let variance = counted as i64 - recorded;
                    if variance != 0 {
                        let adjustment_type = if variance > 0 {
                            AdjustmentType::Increase
                        } else {
                            AdjustmentType::Decrease
                        };
                        stock::record_adjustment(
                            txn,
                            staff_id,
                            product_id,
                            location_id,
                            variance.unsigned_abs() as i32,
                            adjustment_type,
                            &format!(
                                "Cycle count discrepancy: {} counted vs {} recorded",
                                counted, recorded
                            ),
                        )
                        .await?;

                        // Overwrite the balance with the counted value,
                        // collapsing any fragmented rows into the oldest.
                        let mut rows = rows.into_iter();
                        if let Some(first) = rows.next() {
                            for extra in rows {
                                inventory::Entity::delete_by_id(extra.id).exec(txn).await?;
                            }
                            if counted == 0 {
                                inventory::Entity::delete_by_id(first.id).exec(txn).await?;
                            } else {
                                let mut active: inventory::ActiveModel = first.into();
                                active.quantity = Set(counted);
                                active.updated_at = Set(chrono::Utc::now());
                                active.update(txn).await?;
                            }
                        }
                    }

                    Ok(CycleCountResult {
                        product_id,
                        location_id,
                        recorded_quantity: recorded,
                        counted_quantity: counted,
                        variance,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        CYCLE_COUNTS.inc();

        if let Err(e) = self
            .event_sender
            .send(Event::CycleCountRecorded {
                product_id: result.product_id,
                location_id: result.location_id,
                counted_quantity: result.counted_quantity,
                variance: result.variance as i32,
            })
            .await
        {
            warn!(error = %e, "failed to publish cycle count event");
        }

        Ok(result)
    }

    /// Files a replenishment request for a product at a location.
    #[instrument(skip(self, request))]
    pub async fn create_replenishment_request(
        &self,
        request: ReplenishmentRequestInput,
    ) -> Result<replenishment_request::Model, ServiceError> {
        request.validate()?;

        let db = self.db_pool.as_ref();
        let product = catalog::product_by_barcode(db, &request.product_barcode).await?;
        let location = catalog::location_by_barcode(db, &request.location_barcode).await?;

        let row = replenishment_request::ActiveModel {
            product_id: Set(product.id),
            location_id: Set(location.id),
            quantity: Set(request.quantity),
            status: Set(ReplenishmentStatus::Pending),
            reason: Set(request.reason),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::ReplenishmentRequested(row.id))
            .await
        {
            warn!(error = %e, "failed to publish replenishment requested event");
        }

        Ok(row)
    }

    /// Approves a pending replenishment request.
    pub async fn approve_replenishment_request(&self, request_id: i64) -> Result<(), ServiceError> {
        self.resolve_replenishment_request(request_id, ReplenishmentStatus::Approved)
            .await
    }

    /// Rejects a pending replenishment request.
    pub async fn reject_replenishment_request(&self, request_id: i64) -> Result<(), ServiceError> {
        self.resolve_replenishment_request(request_id, ReplenishmentStatus::Rejected)
            .await
    }

    async fn resolve_replenishment_request(
        &self,
        request_id: i64,
        next: ReplenishmentStatus,
    ) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let row = replenishment_request::Entity::find_by_id(request_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("replenishment request {}", request_id))
            })?;

        if !row.status.can_transition_to(next) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "replenishment request {} is {}, cannot become {}",
                request_id, row.status, next
            )));
        }

        let mut active: replenishment_request::ActiveModel = row.into();
        active.status = Set(next);
        active.update(db).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::ReplenishmentResolved {
                request_id,
                approved: next == ReplenishmentStatus::Approved,
            })
            .await
        {
            warn!(error = %e, "failed to publish replenishment resolved event");
        }

        Ok(())
    }

    /// Lists pending replenishment requests, oldest first.
    pub async fn list_pending_replenishment_requests(
        &self,
    ) -> Result<Vec<replenishment_request::Model>, ServiceError> {
        Ok(replenishment_request::Entity::find()
            .filter(replenishment_request::Column::Status.eq(ReplenishmentStatus::Pending))
            .order_by_asc(replenishment_request::Column::Id)
            .all(self.db_pool.as_ref())
            .await?)
    }

    /// Total on-hand quantity of a product across every location.
    pub async fn product_on_hand(&self, product_id: i64) -> Result<i64, ServiceError> {
        stock::on_hand_total(self.db_pool.as_ref(), product_id).await
    }

    /// Lists inventory rows with pagination.
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory::Model>, u64), ServiceError> {
        let paginator = inventory::Entity::find()
            .order_by_asc(inventory::Column::Id)
            .paginate(self.db_pool.as_ref(), limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }
}
