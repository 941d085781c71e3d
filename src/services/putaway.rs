use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        location, shipment, shipment_detail, stock_movement, ActivityType, AdjustmentType,
        MovementType, ScanAction, ShipmentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog, stock},
};

/// Storage zone assigned to a product category: one aisle and the racks
/// within it. The mapping is a fixed commissioning-time table.
struct Zone {
    aisle: &'static str,
    racks: &'static [&'static str],
}

fn zone_for_category(category_id: i64) -> Option<Zone> {
    match category_id {
        1 => Some(Zone { aisle: "1", racks: &["1", "2"] }),
        2 => Some(Zone { aisle: "1", racks: &["3", "4"] }),
        3 => Some(Zone { aisle: "2", racks: &["1", "2"] }),
        4 => Some(Zone { aisle: "2", racks: &["3", "4"] }),
        5 => Some(Zone { aisle: "3", racks: &["1", "2"] }),
        6 => Some(Zone { aisle: "3", racks: &["3", "4"] }),
        _ => None,
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PutAwayRequest {
    pub shipment_detail_id: i64,
    #[validate(length(min = 1, message = "Location barcode is required"))]
    pub location_barcode: String,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestedLocation {
    pub location_id: i64,
    pub name: String,
    pub aisle: String,
    pub rack: String,
    pub level: String,
    pub barcode: String,
    pub capacity: i32,
    pub free_capacity: Decimal,
    /// historical stock-movement count touching this location
    pub traffic: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationSuggestions {
    pub shipment_detail_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub locations: Vec<SuggestedLocation>,
}

/// Service moving received goods from the staging area onto shelf
/// locations, with an advisory location-suggestion query.
#[derive(Clone)]
pub struct PutawayService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl PutawayService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Suggests up to three shelf locations for a received line: the
    /// category's zone is filtered to locations with enough free
    /// volumetric capacity, ranked by historical movement traffic
    /// (busiest first, stable on ties). Read-only.
    #[instrument(skip(self))]
    pub async fn suggest_locations(
        &self,
        shipment_detail_id: i64,
    ) -> Result<LocationSuggestions, ServiceError> {
        let db = self.db_pool.as_ref();

        let detail = shipment_detail::Entity::find_by_id(shipment_detail_id)
            .filter(shipment_detail::Column::Status.eq(ShipmentStatus::Received))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "shipment detail {} not found or not received",
                    shipment_detail_id
                ))
            })?;

        let product = catalog::product_by_id(db, detail.product_id).await?;
        let zone = zone_for_category(product.category_id)
            .ok_or(ServiceError::UnsupportedCategory(product.category_id))?;

        let candidates = location::Entity::find()
            .filter(location::Column::Aisle.eq(zone.aisle))
            .filter(location::Column::Rack.is_in(zone.racks.iter().copied()))
            .filter(location::Column::IsStagingArea.eq(false))
            .all(db)
            .await?;

        let mut ranked: Vec<(location::Model, u64)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let traffic = stock_movement::Entity::find()
                .filter(
                    Condition::any()
                        .add(stock_movement::Column::FromLocationId.eq(candidate.id))
                        .add(stock_movement::Column::ToLocationId.eq(candidate.id)),
                )
                .count(db)
                .await?;
            ranked.push((candidate, traffic));
        }
        // Stable sort keeps the candidate listing order on equal traffic.
        ranked.sort_by_key(|(_, traffic)| std::cmp::Reverse(*traffic));

        let needed = product.size * Decimal::from(detail.quantity);
        let mut suggestions = Vec::new();
        for (candidate, traffic) in ranked {
            let used = stock::used_capacity(db, candidate.id).await?;
            let free = Decimal::from(candidate.capacity) - used;
            if free >= needed {
                suggestions.push(SuggestedLocation {
                    location_id: candidate.id,
                    name: candidate.name,
                    aisle: candidate.aisle,
                    rack: candidate.rack,
                    level: candidate.level,
                    barcode: candidate.barcode,
                    capacity: candidate.capacity,
                    free_capacity: free,
                    traffic,
                });
                if suggestions.len() == 3 {
                    break;
                }
            }
        }

        if suggestions.is_empty() {
            return Err(ServiceError::NoSuitableLocation);
        }

        Ok(LocationSuggestions {
            shipment_detail_id,
            product_id: product.id,
            product_name: product.name,
            quantity: detail.quantity,
            locations: suggestions,
        })
    }

    /// Moves quantity of a received line from the staging area to a shelf
    /// location as one atomic unit: staging rows are drained oldest-first
    /// (spanning fragments), the destination is merged, four ledger
    /// records are appended and the line advances to `put_away`. The line
    /// quantity itself is never altered.
    #[instrument(skip(self, request), fields(shipment_detail_id = %request.shipment_detail_id, quantity = %request.quantity))]
    pub async fn put_away(
        &self,
        staff_id: i64,
        request: PutAwayRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        let db = self.db_pool.as_ref();

        let detail = shipment_detail::Entity::find_by_id(request.shipment_detail_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "shipment detail {}",
                    request.shipment_detail_id
                ))
            })?;

        match detail.status {
            ShipmentStatus::Received => {}
            ShipmentStatus::Pending => {
                return Err(ServiceError::InvalidStateTransition(format!(
                    "shipment line {} has not been received yet",
                    detail.id
                )))
            }
            ShipmentStatus::PutAway => {
                return Err(ServiceError::AlreadyProcessed(format!(
                    "shipment line {} has already been put away",
                    detail.id
                )))
            }
        }

        if request.quantity > detail.quantity {
            return Err(ServiceError::InvalidArgument(format!(
                "quantity {} exceeds the {} units on shipment line {}",
                request.quantity, detail.quantity, detail.id
            )));
        }

        let destination = catalog::location_by_barcode(db, &request.location_barcode).await?;
        if destination.is_staging_area {
            return Err(ServiceError::InvalidArgument(
                "destination cannot be the staging area".to_string(),
            ));
        }

        let product = catalog::product_by_id(db, detail.product_id).await?;

        let quantity = request.quantity;
        let product_id = product.id;
        let product_name = product.name.clone();
        let product_size = product.size;
        let destination_id = destination.id;
        let destination_name = destination.name.clone();
        let destination_capacity = destination.capacity;
        let shipment_id = detail.shipment_id;
        let detail_id = detail.id;

        let shipment_complete = db
            .transaction::<_, bool, ServiceError>(move |txn| {
                Box::pin(async move {
                    let staging = stock::staging_area(txn).await?;

                    // Capacity is enforced at put-away time, inside the
                    // same transaction as the write it guards.
                    let used = stock::used_capacity(txn, destination_id).await?;
                    let needed = product_size * Decimal::from(quantity);
                    if Decimal::from(destination_capacity) - used < needed {
                        return Err(ServiceError::InvalidArgument(format!(
                            "location {} lacks capacity for {} units of {}",
                            destination_name, quantity, product_name
                        )));
                    }

                    stock::consume(txn, product_id, staging.id, quantity).await?;
                    stock::deposit(txn, product_id, destination_id, quantity).await?;

                    stock::record_adjustment(
                        txn,
                        staff_id,
                        product_id,
                        staging.id,
                        quantity,
                        AdjustmentType::Decrease,
                        "Put away to another location",
                    )
                    .await?;
                    stock::record_movement(
                        txn,
                        staff_id,
                        product_id,
                        Some(staging.id),
                        Some(destination_id),
                        quantity,
                        MovementType::PutAway,
                    )
                    .await?;
                    stock::record_scan(
                        txn,
                        staff_id,
                        product_id,
                        destination_id,
                        ScanAction::PutAway,
                    )
                    .await?;
                    stock::record_activity(
                        txn,
                        staff_id,
                        ActivityType::PutAway,
                        format!(
                            "Put away {} of product {} to location {}",
                            quantity, product_name, destination_name
                        ),
                    )
                    .await?;

                    let mut line: shipment_detail::ActiveModel = detail.into();
                    line.status = Set(ShipmentStatus::PutAway);
                    line.update(txn).await?;

                    // The shipment is complete once no line lags behind.
                    let unfinished = shipment_detail::Entity::find()
                        .filter(shipment_detail::Column::ShipmentId.eq(shipment_id))
                        .filter(
                            shipment_detail::Column::Status
                                .is_in([ShipmentStatus::Pending, ShipmentStatus::Received]),
                        )
                        .count(txn)
                        .await?;

                    if unfinished == 0 {
                        let header = shipment::Entity::find_by_id(shipment_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("shipment {}", shipment_id))
                            })?;
                        if header.status.can_transition_to(ShipmentStatus::PutAway) {
                            let mut active: shipment::ActiveModel = header.into();
                            active.status = Set(ShipmentStatus::PutAway);
                            active.receive_date = Set(Some(Utc::now()));
                            active.update(txn).await?;
                            return Ok(true);
                        }
                    }

                    Ok(false)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            shipment_detail_id = detail_id,
            location_id = destination_id,
            quantity,
            "put away completed"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::StockPutAway {
                shipment_detail_id: detail_id,
                location_id: destination_id,
                quantity,
            })
            .await
        {
            warn!(error = %e, "failed to publish put away event");
        }
        if shipment_complete {
            if let Err(e) = self.event_sender.send(Event::ShipmentPutAway(shipment_id)).await {
                warn!(error = %e, "failed to publish shipment put away event");
            }
        }

        Ok(())
    }
}
