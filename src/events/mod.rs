use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Stock events
    StockTransferred {
        product_id: i64,
        from_location_id: i64,
        to_location_id: i64,
        quantity: i32,
    },
    StockPutAway {
        shipment_detail_id: i64,
        location_id: i64,
        quantity: i32,
    },
    CycleCountRecorded {
        product_id: i64,
        location_id: i64,
        counted_quantity: i32,
        /// counted minus recorded; zero when the count matched
        variance: i32,
    },

    // Shipment events
    ShipmentLineReceived {
        shipment_id: i64,
        shipment_detail_id: i64,
    },
    ShipmentReceived(i64),
    ShipmentPutAway(i64),

    // Order events
    OrderCreated(i64),
    OrderUpdated(i64),
    OrderCancelled(i64),
    OrderLinePicked {
        order_id: i64,
        order_detail_id: i64,
    },
    OrderPicked(i64),
    OrderPacked(i64),
    OrdersDelivered(Vec<i64>),

    // Wallet events
    WalletCredited {
        customer_id: i64,
        amount: Decimal,
    },
    WalletDebited {
        customer_id: i64,
        amount: Decimal,
    },

    // Replenishment events
    ReplenishmentRequested(i64),
    ReplenishmentResolved {
        request_id: i64,
        approved: bool,
    },
}

// Function to process incoming events. Handlers here are side-effect free
// observers; anything transactional already happened before the event was
// published.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockTransferred {
                product_id,
                from_location_id,
                to_location_id,
                quantity,
            } => {
                info!(
                    product_id,
                    from_location_id, to_location_id, quantity, "stock transferred"
                );
            }
            Event::CycleCountRecorded {
                product_id,
                location_id,
                counted_quantity,
                variance,
            } => {
                if variance != 0 {
                    warn!(
                        product_id,
                        location_id, counted_quantity, variance, "cycle count discrepancy"
                    );
                } else {
                    info!(product_id, location_id, counted_quantity, "cycle count clean");
                }
            }
            Event::ShipmentReceived(shipment_id) => {
                info!(shipment_id, "shipment fully received");
            }
            Event::ShipmentPutAway(shipment_id) => {
                info!(shipment_id, "shipment fully put away");
            }
            Event::OrderCreated(order_id) => {
                info!(order_id, "order created");
            }
            Event::OrderCancelled(order_id) => {
                info!(order_id, "order cancelled");
            }
            Event::OrderPicked(order_id) => {
                info!(order_id, "all order lines picked");
            }
            Event::OrdersDelivered(order_ids) => {
                info!(?order_ids, "orders handed to courier");
            }
            other => {
                info!(event = ?other, "event observed");
            }
        }
    }

    warn!("Event processing loop has ended");
}
