use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        product, shipment, shipment_detail, ActivityType, MovementType, ScanAction, ShipmentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, stock},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ShipmentLineInput {
    pub product_id: i64,
    pub price_at_shipment: rust_decimal::Decimal,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    pub supplier_id: i64,
    pub arrival_date: NaiveDate,
    #[validate(length(min = 1, message = "At least one shipment line is required"))]
    pub details: Vec<ShipmentLineInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiveLineResult {
    pub shipment_id: i64,
    pub shipment_detail_id: i64,
    pub quantity: i32,
    pub shipment_status: ShipmentStatus,
}

/// Service for inbound shipments: intake of supplier shipments and
/// receiving of individual lines into the staging area.
#[derive(Clone)]
pub struct ReceivingService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ReceivingService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers an inbound shipment with its detail lines. Duplicate
    /// products in the input collapse to the first occurrence. Supplier
    /// pricing refreshes the catalog price with a 5% margin.
    #[instrument(skip(self, request), fields(supplier_id = %request.supplier_id))]
    pub async fn create_shipment(
        &self,
        request: CreateShipmentRequest,
    ) -> Result<shipment::Model, ServiceError> {
        request.validate()?;
        if request.details.iter().any(|line| line.quantity <= 0) {
            return Err(ServiceError::InvalidArgument(
                "shipment line quantity must be a positive integer".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();

        let created = db
            .transaction::<_, shipment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = shipment::ActiveModel {
                        supplier_id: Set(request.supplier_id),
                        arrival_date: Set(request.arrival_date),
                        receive_date: Set(None),
                        status: Set(ShipmentStatus::Pending),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let mut seen: HashSet<i64> = HashSet::new();
                    for line in &request.details {
                        if !seen.insert(line.product_id) {
                            continue;
                        }

                        let product = catalog::product_by_id(txn, line.product_id).await?;
                        let mut active: product::ActiveModel = product.into();
                        active.price = Set(line.price_at_shipment * dec!(1.05));
                        active.update(txn).await?;

                        shipment_detail::ActiveModel {
                            shipment_id: Set(header.id),
                            product_id: Set(line.product_id),
                            price_at_shipment: Set(line.price_at_shipment),
                            quantity: Set(line.quantity),
                            status: Set(ShipmentStatus::Pending),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                    }

                    Ok(header)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(shipment_id = created.id, "shipment registered");
        Ok(created)
    }

    /// Receives one pending shipment line into the staging area. Each
    /// receipt appends its own inventory row there; fragments are drained
    /// later by put-away. Re-receiving a line is rejected.
    #[instrument(skip(self), fields(shipment_id = %shipment_id, product = %product_barcode))]
    pub async fn receive_line(
        &self,
        staff_id: i64,
        shipment_id: i64,
        product_barcode: &str,
    ) -> Result<ReceiveLineResult, ServiceError> {
        let db = self.db_pool.as_ref();

        let shipment = shipment::Entity::find_by_id(shipment_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("shipment {}", shipment_id)))?;

        let product = catalog::product_by_barcode(db, product_barcode).await?;

        let detail = shipment_detail::Entity::find()
            .filter(shipment_detail::Column::ShipmentId.eq(shipment.id))
            .filter(shipment_detail::Column::ProductId.eq(product.id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "product {} is not part of shipment {}",
                    product_barcode, shipment_id
                ))
            })?;

        if detail.status != ShipmentStatus::Pending {
            return Err(ServiceError::AlreadyProcessed(format!(
                "shipment line {} has already been received",
                detail.id
            )));
        }

        let product_name = product.name.clone();
        let product_id = product.id;
        let detail_id = detail.id;
        let quantity = detail.quantity;

        let result = db
            .transaction::<_, ReceiveLineResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let staging = stock::staging_area(txn).await?;

                    let mut active: shipment_detail::ActiveModel = detail.into();
                    active.status = Set(ShipmentStatus::Received);
                    active.update(txn).await?;

                    // One fresh row per receipt; no merge with earlier
                    // receipts waiting at the dock.
                    stock::append_row(txn, product_id, staging.id, quantity).await?;

                    stock::record_movement(
                        txn,
                        staff_id,
                        product_id,
                        None,
                        Some(staging.id),
                        quantity,
                        MovementType::Receive,
                    )
                    .await?;
                    stock::record_scan(txn, staff_id, product_id, staging.id, ScanAction::Receive)
                        .await?;
                    stock::record_activity(
                        txn,
                        staff_id,
                        ActivityType::Receive,
                        format!(
                            "Received product {} from shipment {}",
                            product_name, shipment_id
                        ),
                    )
                    .await?;

                    let pending_lines = shipment_detail::Entity::find()
                        .filter(shipment_detail::Column::ShipmentId.eq(shipment.id))
                        .filter(shipment_detail::Column::Status.eq(ShipmentStatus::Pending))
                        .count(txn)
                        .await?;

                    let mut shipment_status = shipment.status;
                    if pending_lines == 0
                        && shipment.status.can_transition_to(ShipmentStatus::Received)
                    {
                        let mut header: shipment::ActiveModel = shipment.into();
                        header.status = Set(ShipmentStatus::Received);
                        header.receive_date = Set(Some(Utc::now()));
                        header.update(txn).await?;
                        shipment_status = ShipmentStatus::Received;
                    }

                    Ok(ReceiveLineResult {
                        shipment_id,
                        shipment_detail_id: detail_id,
                        quantity,
                        shipment_status,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::ShipmentLineReceived {
                shipment_id,
                shipment_detail_id: result.shipment_detail_id,
            })
            .await
        {
            warn!(error = %e, "failed to publish shipment line received event");
        }
        if result.shipment_status == ShipmentStatus::Received {
            if let Err(e) = self.event_sender.send(Event::ShipmentReceived(shipment_id)).await {
                warn!(error = %e, "failed to publish shipment received event");
            }
        }

        Ok(result)
    }

    /// Lines waiting at the dock for put-away.
    pub async fn received_lines(&self) -> Result<Vec<shipment_detail::Model>, ServiceError> {
        Ok(shipment_detail::Entity::find()
            .filter(shipment_detail::Column::Status.eq(ShipmentStatus::Received))
            .order_by_asc(shipment_detail::Column::Id)
            .all(self.db_pool.as_ref())
            .await?)
    }

    /// Shipments ordered by lifecycle stage: pending first.
    pub async fn list_shipments(&self) -> Result<Vec<shipment::Model>, ServiceError> {
        let mut shipments = shipment::Entity::find()
            .order_by_asc(shipment::Column::Id)
            .all(self.db_pool.as_ref())
            .await?;
        shipments.sort_by_key(|s| match s.status {
            ShipmentStatus::Pending => 0,
            ShipmentStatus::Received => 1,
            ShipmentStatus::PutAway => 2,
        });
        Ok(shipments)
    }
}
