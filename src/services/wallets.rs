use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    db::DbPool,
    entities::{transaction_log, wallet, TransactionType},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Customer wallets: balance reads, deposits and the per-customer
/// transaction log. Debits and refunds happen inside the order settlement
/// paths; this service owns everything else.
#[derive(Clone)]
pub struct WalletService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl WalletService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Returns the customer's wallet, creating an empty one on first use.
    pub async fn get_or_create(&self, customer_id: i64) -> Result<wallet::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        if let Some(existing) = wallet::Entity::find()
            .filter(wallet::Column::CustomerId.eq(customer_id))
            .one(db)
            .await?
        {
            return Ok(existing);
        }

        let created = wallet::ActiveModel {
            customer_id: Set(customer_id),
            balance: Set(Decimal::ZERO),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    /// Credits a wallet and appends the matching deposit log entry in one
    /// transaction.
    #[instrument(skip(self), fields(customer_id = %customer_id, amount = %amount))]
    pub async fn add_funds(
        &self,
        customer_id: i64,
        amount: Decimal,
    ) -> Result<wallet::Model, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidArgument(
                "deposit amount must be positive".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();

        let updated = db
            .transaction::<_, wallet::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = wallet::Entity::find()
                        .filter(wallet::Column::CustomerId.eq(customer_id))
                        .one(txn)
                        .await?;

                    let now = Utc::now();
                    let updated = match existing {
                        Some(row) => {
                            let new_balance = row.balance + amount;
                            let mut active: wallet::ActiveModel = row.into();
                            active.balance = Set(new_balance);
                            active.updated_at = Set(now);
                            active.update(txn).await?
                        }
                        None => {
                            wallet::ActiveModel {
                                customer_id: Set(customer_id),
                                balance: Set(amount),
                                updated_at: Set(now),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await?
                        }
                    };

                    transaction_log::ActiveModel {
                        customer_id: Set(customer_id),
                        amount: Set(amount),
                        transaction_type: Set(TransactionType::Deposit),
                        description: Set(Some("Added funds to wallet".to_string())),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(updated)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(customer_id, amount = %amount, balance = %updated.balance, "funds added");

        if let Err(e) = self
            .event_sender
            .send(Event::WalletCredited {
                customer_id,
                amount,
            })
            .await
        {
            warn!(error = %e, "failed to publish wallet credited event");
        }

        Ok(updated)
    }

    /// Transaction log for a customer, newest first.
    pub async fn transactions(
        &self,
        customer_id: i64,
    ) -> Result<Vec<transaction_log::Model>, ServiceError> {
        Ok(transaction_log::Entity::find()
            .filter(transaction_log::Column::CustomerId.eq(customer_id))
            .order_by_desc(transaction_log::Column::Id)
            .all(self.db_pool.as_ref())
            .await?)
    }
}
