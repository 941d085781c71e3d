//! Warehouse API Library
//!
//! Core of a warehouse-management backend: the inventory quantity store,
//! fulfillment operations (transfer, receive, put-away, pick, pack,
//! delivery), order/wallet settlement and the append-only stock ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub inventory_service: services::inventory::InventoryService,
    pub receiving_service: services::receiving::ReceivingService,
    pub putaway_service: services::putaway::PutawayService,
    pub picking_service: services::picking::PickingService,
    pub order_service: services::orders::OrderService,
    pub wallet_service: services::wallets::WalletService,
    pub notification_service: services::notifications::NotificationService,
}

impl AppState {
    /// Wires every service onto one shared pool and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let notification_service = services::notifications::NotificationService::new(
            db.clone(),
            config.admin_user_id,
        );

        Self {
            inventory_service: services::inventory::InventoryService::new(
                db.clone(),
                event_sender.clone(),
            ),
            receiving_service: services::receiving::ReceivingService::new(
                db.clone(),
                event_sender.clone(),
            ),
            putaway_service: services::putaway::PutawayService::new(
                db.clone(),
                event_sender.clone(),
            ),
            picking_service: services::picking::PickingService::new(
                db.clone(),
                event_sender.clone(),
                notification_service.clone(),
            ),
            order_service: services::orders::OrderService::new(
                db.clone(),
                event_sender.clone(),
                notification_service.clone(),
            ),
            wallet_service: services::wallets::WalletService::new(
                db.clone(),
                event_sender.clone(),
            ),
            notification_service,
            db,
            config,
            event_sender,
        }
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_carries_data_and_timestamp() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        DateTime::parse_from_rfc3339(&response.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
