mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

use common::{seed_category, seed_inventory, seed_location, seed_product, seed_supplier, seed_warehouse};
use warehouse_api::{
    entities::{
        barcode_scan, inventory, product, shipment, shipment_detail, stock_adjustment,
        stock_movement, AdjustmentType, MovementType, ScanAction, ShipmentStatus,
    },
    errors::ServiceError,
    services::{
        putaway::PutAwayRequest,
        receiving::{CreateShipmentRequest, ShipmentLineInput},
    },
    AppState,
};

const STAFF: i64 = 7;

struct Fixture {
    state: AppState,
    supplier_id: i64,
    category_id: i64,
    staging_id: i64,
    shelf: warehouse_api::entities::location::Model,
    product: product::Model,
}

async fn fixture() -> Fixture {
    let state = common::setup().await;
    let db = state.db.as_ref();

    let wh = seed_warehouse(db).await;
    let cat = seed_category(db, "Beverages").await; // id 1 -> aisle 1, racks 1-2
    let sup = seed_supplier(db, "Acme Goods").await;
    let dock = seed_location(db, wh.id, "Docking Area", "0", "0", "DOCK", 10_000, true).await;
    let shelf = seed_location(db, wh.id, "A-01-01", "1", "1", "SHELF-1", 100, false).await;
    let product =
        seed_product(db, cat.id, sup.id, "Sparkling Water", "SKU-P", dec!(1.00), dec!(10.00)).await;

    Fixture {
        supplier_id: sup.id,
        category_id: cat.id,
        staging_id: dock.id,
        shelf,
        product,
        state,
    }
}

/// Creates a one-line shipment and receives it, returning the detail.
async fn received_line(fx: &Fixture, quantity: i32) -> shipment_detail::Model {
    let header = fx
        .state
        .receiving_service
        .create_shipment(CreateShipmentRequest {
            supplier_id: fx.supplier_id,
            arrival_date: common::arrival(),
            details: vec![ShipmentLineInput {
                product_id: fx.product.id,
                price_at_shipment: dec!(10.00),
                quantity,
            }],
        })
        .await
        .expect("shipment should be created");

    fx.state
        .receiving_service
        .receive_line(STAFF, header.id, &fx.product.barcode)
        .await
        .expect("line should be received");

    shipment_detail::Entity::find()
        .filter(shipment_detail::Column::ShipmentId.eq(header.id))
        .one(fx.state.db.as_ref())
        .await
        .unwrap()
        .unwrap()
}

async fn staging_rows(fx: &Fixture) -> Vec<inventory::Model> {
    inventory::Entity::find()
        .filter(inventory::Column::LocationId.eq(fx.staging_id))
        .order_by_asc(inventory::Column::Id)
        .all(fx.state.db.as_ref())
        .await
        .unwrap()
}

#[tokio::test]
async fn create_shipment_collapses_duplicates_and_refreshes_price() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    let header = fx
        .state
        .receiving_service
        .create_shipment(CreateShipmentRequest {
            supplier_id: fx.supplier_id,
            arrival_date: common::arrival(),
            details: vec![
                ShipmentLineInput {
                    product_id: fx.product.id,
                    price_at_shipment: dec!(10.00),
                    quantity: 14,
                },
                ShipmentLineInput {
                    product_id: fx.product.id,
                    price_at_shipment: dec!(99.00),
                    quantity: 5,
                },
            ],
        })
        .await
        .expect("shipment should be created");

    assert_eq!(header.status, ShipmentStatus::Pending);

    let lines = shipment_detail::Entity::find()
        .filter(shipment_detail::Column::ShipmentId.eq(header.id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 14);
    assert_eq!(lines[0].price_at_shipment, dec!(10.00));

    // Catalog price refreshed from the first occurrence with a 5% margin.
    let refreshed = product::Entity::find_by_id(fx.product.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.price, dec!(10.50));
}

#[tokio::test]
async fn receive_line_appends_fresh_staging_rows() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    received_line(&fx, 7).await;
    received_line(&fx, 7).await;

    // Two receipts, two rows at the dock; no merge.
    let rows = staging_rows(&fx).await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.quantity == 7));

    let receive_movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::MovementType.eq(MovementType::Receive))
        .all(db)
        .await
        .unwrap();
    assert_eq!(receive_movements.len(), 2);
    assert!(receive_movements
        .iter()
        .all(|m| m.from_location_id.is_none() && m.to_location_id == Some(fx.staging_id)));

    let scans = barcode_scan::Entity::find()
        .filter(barcode_scan::Column::Action.eq(ScanAction::Receive))
        .count(db)
        .await
        .unwrap();
    assert_eq!(scans, 2);
}

#[tokio::test]
async fn receive_line_twice_is_rejected() {
    let fx = fixture().await;
    let line = received_line(&fx, 7).await;

    let err = fx
        .state
        .receiving_service
        .receive_line(STAFF, line.shipment_id, &fx.product.barcode)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::AlreadyProcessed(_));

    // No second staging row appeared.
    assert_eq!(staging_rows(&fx).await.len(), 1);
}

#[tokio::test]
async fn shipment_escalates_to_received_when_no_line_is_pending() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    let other = seed_product(
        db,
        fx.category_id,
        fx.supplier_id,
        "Still Water",
        "SKU-Q",
        dec!(1.00),
        dec!(8.00),
    )
    .await;

    let header = fx
        .state
        .receiving_service
        .create_shipment(CreateShipmentRequest {
            supplier_id: fx.supplier_id,
            arrival_date: common::arrival(),
            details: vec![
                ShipmentLineInput {
                    product_id: fx.product.id,
                    price_at_shipment: dec!(10.00),
                    quantity: 3,
                },
                ShipmentLineInput {
                    product_id: other.id,
                    price_at_shipment: dec!(6.00),
                    quantity: 4,
                },
            ],
        })
        .await
        .unwrap();

    let first = fx
        .state
        .receiving_service
        .receive_line(STAFF, header.id, &fx.product.barcode)
        .await
        .unwrap();
    assert_eq!(first.shipment_status, ShipmentStatus::Pending);

    let second = fx
        .state
        .receiving_service
        .receive_line(STAFF, header.id, &other.barcode)
        .await
        .unwrap();
    assert_eq!(second.shipment_status, ShipmentStatus::Received);

    let refreshed = shipment::Entity::find_by_id(header.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, ShipmentStatus::Received);
    assert!(refreshed.receive_date.is_some());
}

#[tokio::test]
async fn put_away_spans_fragmented_staging_rows() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    // A 14-unit line already received, with the dock fragmented into two
    // rows of 7 from separate receipts.
    let header = fx
        .state
        .receiving_service
        .create_shipment(CreateShipmentRequest {
            supplier_id: fx.supplier_id,
            arrival_date: common::arrival(),
            details: vec![ShipmentLineInput {
                product_id: fx.product.id,
                price_at_shipment: dec!(10.00),
                quantity: 14,
            }],
        })
        .await
        .unwrap();
    let line = shipment_detail::Entity::find()
        .filter(shipment_detail::Column::ShipmentId.eq(header.id))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let line_id = line.id;
    let mut line_active: shipment_detail::ActiveModel = line.into();
    line_active.status = Set(ShipmentStatus::Received);
    line_active.update(db).await.unwrap();
    let mut header_active: shipment::ActiveModel = header.into();
    header_active.status = Set(ShipmentStatus::Received);
    header_active.receive_date = Set(Some(Utc::now()));
    header_active.update(db).await.unwrap();

    seed_inventory(db, fx.product.id, fx.staging_id, 7).await;
    seed_inventory(db, fx.product.id, fx.staging_id, 7).await;

    fx.state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line_id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 12,
            },
        )
        .await
        .expect("put away should succeed");

    // First dock row consumed whole, second left at 2.
    let rows = staging_rows(&fx).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 2);

    let shelf_rows = inventory::Entity::find()
        .filter(inventory::Column::LocationId.eq(fx.shelf.id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(shelf_rows.len(), 1);
    assert_eq!(shelf_rows[0].quantity, 12);

    // One movement for the whole put-away, not one per fragment.
    let movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::MovementType.eq(MovementType::PutAway))
        .all(db)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, 12);
    assert_eq!(movements[0].from_location_id, Some(fx.staging_id));
    assert_eq!(movements[0].to_location_id, Some(fx.shelf.id));

    let adjustments = stock_adjustment::Entity::find()
        .filter(stock_adjustment::Column::AdjustmentType.eq(AdjustmentType::Decrease))
        .all(db)
        .await
        .unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].quantity, 12);
    assert_eq!(adjustments[0].location_id, fx.staging_id);

    // Line advanced without touching its quantity; single-line shipment
    // escalates to put_away.
    let line = shipment_detail::Entity::find_by_id(line_id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line.status, ShipmentStatus::PutAway);
    assert_eq!(line.quantity, 14);

    let header = shipment::Entity::find()
        .order_by_asc(shipment::Column::Id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, ShipmentStatus::PutAway);
}

#[tokio::test]
async fn put_away_short_staging_total_is_atomic() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();
    let line = received_line(&fx, 14).await;

    // The dock only holds the 14 units of this receipt; drain 10 away.
    fx.state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line.id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 10,
            },
        )
        .await
        .unwrap();

    // Second put-away asking for more than the 4 left must fail whole.
    let line2 = received_line(&fx, 14).await;
    // Remove the new receipt's stock so the dock is short again.
    let rows = staging_rows(&fx).await;
    for row in rows.iter().filter(|r| r.quantity == 14) {
        inventory::Entity::delete_by_id(row.id).exec(db).await.unwrap();
    }

    let before = staging_rows(&fx).await;
    let err = fx
        .state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line2.id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 6,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientQuantity(_));

    let after = staging_rows(&fx).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn put_away_rejects_bad_quantities_and_states() {
    let fx = fixture().await;
    let line = received_line(&fx, 5).await;

    // More than the line carries.
    let err = fx
        .state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line.id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 6,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidArgument(_));

    // Pending line cannot be put away.
    let header = fx
        .state
        .receiving_service
        .create_shipment(CreateShipmentRequest {
            supplier_id: fx.supplier_id,
            arrival_date: common::arrival(),
            details: vec![ShipmentLineInput {
                product_id: fx.product.id,
                price_at_shipment: dec!(10.00),
                quantity: 5,
            }],
        })
        .await
        .unwrap();
    let pending_line = shipment_detail::Entity::find()
        .filter(shipment_detail::Column::ShipmentId.eq(header.id))
        .one(fx.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let err = fx
        .state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: pending_line.id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 5,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStateTransition(_));

    // Completed line cannot be put away twice.
    fx.state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line.id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 5,
            },
        )
        .await
        .unwrap();
    let err = fx
        .state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line.id,
                location_barcode: fx.shelf.barcode.clone(),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::AlreadyProcessed(_));
}

#[tokio::test]
async fn put_away_enforces_destination_capacity() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    // A tight shelf: capacity 10 volumetric units, 8 already used.
    let wh = warehouse_api::entities::warehouse::Entity::find()
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let tight = seed_location(db, wh.id, "A-01-09", "1", "2", "SHELF-TIGHT", 10, false).await;
    seed_inventory(db, fx.product.id, tight.id, 8).await;

    let line = received_line(&fx, 5).await;
    let err = fx
        .state
        .putaway_service
        .put_away(
            STAFF,
            PutAwayRequest {
                shipment_detail_id: line.id,
                location_barcode: tight.barcode.clone(),
                quantity: 5,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidArgument(_));

    // Dock untouched by the failed attempt.
    assert_eq!(staging_rows(&fx).await.len(), 1);
    assert_eq!(staging_rows(&fx).await[0].quantity, 5);
}

#[tokio::test]
async fn suggestions_rank_by_traffic_and_filter_by_capacity() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    let wh = warehouse_api::entities::warehouse::Entity::find()
        .one(db)
        .await
        .unwrap()
        .unwrap();
    // Same zone as SHELF-1 (category 1 -> aisle 1, racks 1-2).
    let busy = seed_location(db, wh.id, "A-02-01", "1", "2", "SHELF-BUSY", 100, false).await;
    let cramped = seed_location(db, wh.id, "A-02-02", "1", "2", "SHELF-CRAMPED", 3, false).await;
    // Out-of-zone location must never appear.
    seed_location(db, wh.id, "B-01-01", "2", "1", "SHELF-OTHER-ZONE", 100, false).await;

    // Give `busy` pick history so it outranks the others.
    for _ in 0..3 {
        sea_orm::ActiveModelTrait::insert(
            stock_movement::ActiveModel {
                product_id: Set(fx.product.id),
                from_location_id: Set(Some(busy.id)),
                to_location_id: Set(None),
                quantity: Set(1),
                movement_type: Set(MovementType::Pick),
                staff_id: Set(STAFF),
                created_at: Set(Utc::now()),
                ..Default::default()
            },
            db,
        )
        .await
        .unwrap();
    }

    let line = received_line(&fx, 5).await;
    let suggestions = fx
        .state
        .putaway_service
        .suggest_locations(line.id)
        .await
        .expect("suggestions should exist");

    // Needs 5 volumetric units: the cramped shelf (capacity 3) is out.
    let barcodes: Vec<&str> = suggestions
        .locations
        .iter()
        .map(|l| l.barcode.as_str())
        .collect();
    assert!(!barcodes.contains(&"SHELF-CRAMPED"));
    assert!(!barcodes.contains(&"SHELF-OTHER-ZONE"));
    assert_eq!(barcodes[0], "SHELF-BUSY");
    assert!(suggestions.locations.len() <= 3);
}

#[tokio::test]
async fn suggestions_for_unmapped_category_are_rejected() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    // Categories beyond the six zoned ones have no storage mapping.
    let mut last = fx.category_id;
    for name in ["B", "C", "D", "E", "F", "G"] {
        last = seed_category(db, name).await.id;
    }
    let oddball = seed_product(
        db,
        last,
        fx.supplier_id,
        "Unzoned Gadget",
        "SKU-ODD",
        dec!(1.00),
        dec!(5.00),
    )
    .await;

    let header = fx
        .state
        .receiving_service
        .create_shipment(CreateShipmentRequest {
            supplier_id: fx.supplier_id,
            arrival_date: common::arrival(),
            details: vec![ShipmentLineInput {
                product_id: oddball.id,
                price_at_shipment: dec!(4.00),
                quantity: 1,
            }],
        })
        .await
        .unwrap();
    fx.state
        .receiving_service
        .receive_line(STAFF, header.id, &oddball.barcode)
        .await
        .unwrap();
    let line = shipment_detail::Entity::find()
        .filter(shipment_detail::Column::ShipmentId.eq(header.id))
        .one(db)
        .await
        .unwrap()
        .unwrap();

    let err = fx
        .state
        .putaway_service
        .suggest_locations(line.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UnsupportedCategory(_));
}

#[tokio::test]
async fn suggestions_with_no_fitting_location_report_no_suitable_location() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();

    // Fill the only zoned shelf so nothing can take the receipt.
    seed_inventory(db, fx.product.id, fx.shelf.id, 100).await;

    let line = received_line(&fx, 50).await;
    let err = fx
        .state
        .putaway_service
        .suggest_locations(line.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NoSuitableLocation);
}
