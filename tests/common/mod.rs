//! Shared setup for integration tests: an isolated in-memory database per
//! test with the full schema, plus seed helpers for reference data.

#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use warehouse_api::{
    config::AppConfig,
    db::{establish_connection_with_config, run_migrations, DbConfig, DbPool},
    entities::{category, inventory, location, product, supplier, warehouse, InventoryStatus},
    events::{process_events, EventSender},
    AppState,
};

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "test".into(),
        log_level: "info".into(),
        log_json: false,
        auto_migrate: false,
        admin_user_id: 1,
        event_channel_capacity: 64,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        db_acquire_timeout_secs: 5,
    }
}

/// Builds a fresh in-memory database (single connection so the schema is
/// shared), runs migrations and wires the full service state.
pub async fn setup() -> AppState {
    let db_config = DbConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(60),
        acquire_timeout: Duration::from_secs(5),
    };
    let pool = establish_connection_with_config(&db_config)
        .await
        .expect("failed to open in-memory database");
    run_migrations(&pool).await.expect("failed to run migrations");

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));

    AppState::new(Arc::new(pool), test_config(), EventSender::new(tx))
}

pub async fn seed_warehouse(db: &DbPool) -> warehouse::Model {
    warehouse::ActiveModel {
        name: Set("Main Warehouse".to_string()),
        warehouse_location: Set("Springfield".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed warehouse")
}

pub async fn seed_category(db: &DbPool, name: &str) -> category::Model {
    category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} products", name)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed category")
}

pub async fn seed_supplier(db: &DbPool, name: &str) -> supplier::Model {
    supplier::ActiveModel {
        name: Set(name.to_string()),
        contact_person: Set("Sam Vendor".to_string()),
        email: Set(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        phone: Set("555-0100".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed supplier")
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_location(
    db: &DbPool,
    warehouse_id: i64,
    name: &str,
    aisle: &str,
    rack: &str,
    barcode: &str,
    capacity: i32,
    is_staging_area: bool,
) -> location::Model {
    location::ActiveModel {
        warehouse_id: Set(warehouse_id),
        name: Set(name.to_string()),
        aisle: Set(aisle.to_string()),
        rack: Set(rack.to_string()),
        level: Set("1".to_string()),
        barcode: Set(barcode.to_string()),
        capacity: Set(capacity),
        is_staging_area: Set(is_staging_area),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed location")
}

pub async fn seed_product(
    db: &DbPool,
    category_id: i64,
    supplier_id: i64,
    name: &str,
    barcode: &str,
    size: Decimal,
    price: Decimal,
) -> product::Model {
    product::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} unit", name)),
        category_id: Set(category_id),
        supplier_id: Set(supplier_id),
        size: Set(size),
        price: Set(price),
        barcode: Set(barcode.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed product")
}

pub async fn seed_inventory(
    db: &DbPool,
    product_id: i64,
    location_id: i64,
    quantity: i32,
) -> inventory::Model {
    let now = Utc::now();
    inventory::ActiveModel {
        product_id: Set(product_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        status: Set(InventoryStatus::Available),
        expiry_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed inventory")
}

pub fn arrival() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}
