mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use common::{seed_category, seed_inventory, seed_location, seed_product, seed_supplier, seed_warehouse};
use warehouse_api::{
    entities::{
        notification, order, order_detail, transaction_log, wallet, OrderStatus, TransactionType,
    },
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderLineInput, UpdateOrderRequest},
    AppState,
};

const CUSTOMER: i64 = 100;
const ADMIN: i64 = 1;

struct Fixture {
    state: AppState,
    product_id: i64,
}

async fn fixture() -> Fixture {
    let state = common::setup().await;
    let db = state.db.as_ref();

    let wh = seed_warehouse(db).await;
    let cat = seed_category(db, "Beverages").await;
    let sup = seed_supplier(db, "Acme Goods").await;
    let shelf = seed_location(db, wh.id, "A-01-01", "1", "1", "SHELF-1", 1000, false).await;
    let product =
        seed_product(db, cat.id, sup.id, "Sparkling Water", "SKU-P", dec!(1.00), dec!(20.00)).await;
    seed_inventory(db, product.id, shelf.id, 50).await;

    Fixture {
        product_id: product.id,
        state,
    }
}

fn one_line(product_id: i64, quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        lines: vec![OrderLineInput {
            product_id,
            quantity,
        }],
        priority: None,
    }
}

async fn wallet_balance(state: &AppState, customer_id: i64) -> Decimal {
    wallet::Entity::find()
        .filter(wallet::Column::CustomerId.eq(customer_id))
        .one(state.db.as_ref())
        .await
        .unwrap()
        .map(|w| w.balance)
        .unwrap_or_default()
}

/// balance == sum(deposit) + sum(refund) - sum(purchase), always.
async fn assert_wallet_reconciles(state: &AppState, customer_id: i64) {
    let logs = transaction_log::Entity::find()
        .filter(transaction_log::Column::CustomerId.eq(customer_id))
        .all(state.db.as_ref())
        .await
        .unwrap();

    let mut expected = Decimal::ZERO;
    for entry in &logs {
        match entry.transaction_type {
            TransactionType::Deposit | TransactionType::Refund => expected += entry.amount,
            TransactionType::Purchase => expected -= entry.amount,
        }
    }

    assert_eq!(wallet_balance(state, customer_id).await, expected);
}

#[tokio::test]
async fn add_funds_creates_wallet_and_logs_deposit() {
    let fx = fixture().await;

    let wallet_row = fx
        .state
        .wallet_service
        .add_funds(CUSTOMER, dec!(150.00))
        .await
        .expect("deposit should succeed");
    assert_eq!(wallet_row.balance, dec!(150.00));

    let logs = fx.state.wallet_service.transactions(CUSTOMER).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].transaction_type, TransactionType::Deposit);
    assert_eq!(logs[0].amount, dec!(150.00));

    assert_wallet_reconciles(&fx.state, CUSTOMER).await;

    let err = fx
        .state
        .wallet_service
        .add_funds(CUSTOMER, dec!(-5.00))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidArgument(_));
}

#[tokio::test]
async fn create_order_freezes_total_and_debits_wallet() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(100.00))
        .await
        .unwrap();

    let created = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 3))
        .await
        .expect("order should be created");

    assert_eq!(created.order.total_price, dec!(60.00));
    assert_eq!(created.order.status, OrderStatus::Pending);
    assert_eq!(created.details.len(), 1);
    assert_eq!(created.details[0].price_at_sale, dec!(20.00));
    assert_eq!(created.details[0].status, OrderStatus::Pending);

    assert_eq!(wallet_balance(&fx.state, CUSTOMER).await, dec!(40.00));

    let purchases = transaction_log::Entity::find()
        .filter(transaction_log::Column::TransactionType.eq(TransactionType::Purchase))
        .all(fx.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].amount, dec!(60.00));

    // Admin is told about the new order.
    let admin_notes = notification::Entity::find()
        .filter(notification::Column::UserId.eq(ADMIN))
        .count(fx.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(admin_notes, 1);

    assert_wallet_reconciles(&fx.state, CUSTOMER).await;
}

#[tokio::test]
async fn create_order_with_insufficient_funds_writes_nothing() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(50.00))
        .await
        .unwrap();

    // 3 x 20.00 = 60.00 against a 50.00 balance.
    let err = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 3))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientFunds(_));

    assert_eq!(order::Entity::find().count(fx.state.db.as_ref()).await.unwrap(), 0);
    assert_eq!(wallet_balance(&fx.state, CUSTOMER).await, dec!(50.00));
    assert_wallet_reconciles(&fx.state, CUSTOMER).await;
}

#[tokio::test]
async fn create_order_respects_other_pending_reservations() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(5000.00))
        .await
        .unwrap();

    // 50 on hand. First order reserves 30.
    fx.state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 30))
        .await
        .unwrap();

    // 25 more would overcommit the remaining 20.
    let err = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 25))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientQuantity(_));

    assert_eq!(order::Entity::find().count(fx.state.db.as_ref()).await.unwrap(), 1);

    // 20 exactly still fits.
    fx.state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 20))
        .await
        .expect("remaining availability should be orderable");

    assert_wallet_reconciles(&fx.state, CUSTOMER).await;
}

#[tokio::test]
async fn create_order_with_unknown_product_is_not_found() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(100.00))
        .await
        .unwrap();

    let err = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(9999, 1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn create_order_rejects_non_positive_line_quantity() {
    let fx = fixture().await;

    let err = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 0))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidArgument(_));
}

#[tokio::test]
async fn update_order_settles_the_difference() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(200.00))
        .await
        .unwrap();

    let created = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 3))
        .await
        .unwrap();
    assert_eq!(wallet_balance(&fx.state, CUSTOMER).await, dec!(140.00));

    // Shrink to one unit: 40.00 flows back as a refund.
    let updated = fx
        .state
        .order_service
        .update_order(
            created.order.id,
            UpdateOrderRequest {
                lines: vec![OrderLineInput {
                    product_id: fx.product_id,
                    quantity: 1,
                }],
            },
        )
        .await
        .expect("update should succeed");
    assert_eq!(updated.order.total_price, dec!(20.00));
    assert_eq!(updated.details.len(), 1);
    assert_eq!(updated.details[0].quantity, 1);
    assert_eq!(wallet_balance(&fx.state, CUSTOMER).await, dec!(180.00));

    let refunds = transaction_log::Entity::find()
        .filter(transaction_log::Column::TransactionType.eq(TransactionType::Refund))
        .all(fx.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, dec!(40.00));

    // Grow to four units: the 60.00 difference is a further purchase.
    fx.state
        .order_service
        .update_order(
            created.order.id,
            UpdateOrderRequest {
                lines: vec![OrderLineInput {
                    product_id: fx.product_id,
                    quantity: 4,
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(wallet_balance(&fx.state, CUSTOMER).await, dec!(120.00));

    assert_wallet_reconciles(&fx.state, CUSTOMER).await;
}

#[tokio::test]
async fn update_order_increase_rechecks_affordability() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(65.00))
        .await
        .unwrap();

    let created = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 3))
        .await
        .unwrap();
    // 5.00 left; growing the order by 20.00 must fail.
    let err = fx
        .state
        .order_service
        .update_order(
            created.order.id,
            UpdateOrderRequest {
                lines: vec![OrderLineInput {
                    product_id: fx.product_id,
                    quantity: 4,
                }],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientFunds(_));

    // Order untouched by the failed update.
    let reloaded = fx.state.order_service.get_order(created.order.id).await.unwrap();
    assert_eq!(reloaded.order.total_price, dec!(60.00));
    assert_eq!(reloaded.details[0].quantity, 3);
    assert_wallet_reconciles(&fx.state, CUSTOMER).await;
}

#[tokio::test]
async fn update_order_requires_pending_status() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(100.00))
        .await
        .unwrap();

    let created = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 1))
        .await
        .unwrap();

    let row = order::Entity::find_by_id(created.order.id)
        .one(fx.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let mut active: order::ActiveModel = row.into();
    active.status = Set(OrderStatus::Picked);
    active.update(fx.state.db.as_ref()).await.unwrap();

    let err = fx
        .state
        .order_service
        .update_order(
            created.order.id,
            UpdateOrderRequest {
                lines: vec![OrderLineInput {
                    product_id: fx.product_id,
                    quantity: 2,
                }],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStateTransition(_));
}

#[tokio::test]
async fn cancel_order_refunds_in_full_and_is_terminal() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(100.00))
        .await
        .unwrap();

    let created = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 3))
        .await
        .unwrap();

    fx.state
        .order_service
        .cancel_order(CUSTOMER, created.order.id)
        .await
        .expect("cancel should succeed");

    assert_eq!(wallet_balance(&fx.state, CUSTOMER).await, dec!(100.00));

    let reloaded = fx.state.order_service.get_order(created.order.id).await.unwrap();
    assert_eq!(reloaded.order.status, OrderStatus::Cancelled);
    assert!(reloaded
        .details
        .iter()
        .all(|d| d.status == OrderStatus::Cancelled));

    // Terminal: a second cancellation is rejected.
    let err = fx
        .state
        .order_service
        .cancel_order(CUSTOMER, created.order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStateTransition(_));

    assert_wallet_reconciles(&fx.state, CUSTOMER).await;
}

#[tokio::test]
async fn cancel_order_requires_ownership() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(100.00))
        .await
        .unwrap();

    let created = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 1))
        .await
        .unwrap();

    let err = fx
        .state
        .order_service
        .cancel_order(CUSTOMER + 1, created.order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cancelled_reservation_frees_availability() {
    let fx = fixture().await;
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(5000.00))
        .await
        .unwrap();

    let first = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 40))
        .await
        .unwrap();

    // 50 on hand, 40 reserved: 20 more will not fit.
    let err = fx
        .state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 20))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientQuantity(_));

    fx.state
        .order_service
        .cancel_order(CUSTOMER, first.order.id)
        .await
        .unwrap();

    // The cancelled order's reservation no longer counts.
    fx.state
        .order_service
        .create_order(CUSTOMER, one_line(fx.product_id, 20))
        .await
        .expect("availability should be freed by cancellation");
}

#[tokio::test]
async fn order_detail_totals_match_frozen_total() {
    let fx = fixture().await;
    let db = fx.state.db.as_ref();
    fx.state
        .wallet_service
        .add_funds(CUSTOMER, dec!(500.00))
        .await
        .unwrap();

    let second = seed_product(
        db,
        1,
        1,
        "Still Water",
        "SKU-Q",
        dec!(1.00),
        dec!(8.00),
    )
    .await;
    let shelf = warehouse_api::entities::location::Entity::find()
        .one(db)
        .await
        .unwrap()
        .unwrap();
    seed_inventory(db, second.id, shelf.id, 50).await;

    let created = fx
        .state
        .order_service
        .create_order(
            CUSTOMER,
            CreateOrderRequest {
                lines: vec![
                    OrderLineInput {
                        product_id: fx.product_id,
                        quantity: 2,
                    },
                    OrderLineInput {
                        product_id: second.id,
                        quantity: 5,
                    },
                ],
                priority: None,
            },
        )
        .await
        .unwrap();

    let detail_total: Decimal = order_detail::Entity::find()
        .filter(order_detail::Column::OrderId.eq(created.order.id))
        .all(db)
        .await
        .unwrap()
        .iter()
        .map(|d| d.price_at_sale * Decimal::from(d.quantity))
        .sum();
    assert_eq!(detail_total, created.order.total_price);
    assert_eq!(created.order.total_price, dec!(80.00));
}
