use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::warn;

use crate::{
    db::DbPool,
    entities::{notification, NotificationStatus},
    errors::ServiceError,
};

/// Fire-and-forget notification sink. Messages are queued as `unread`
/// notification rows; a failed write is logged and swallowed so it can
/// never roll back or fail the operation that triggered it.
#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
    admin_user_id: i64,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>, admin_user_id: i64) -> Self {
        Self {
            db_pool,
            admin_user_id,
        }
    }

    /// Queues a message for a user. Best-effort: errors are logged, not
    /// returned.
    pub async fn notify(&self, user_id: i64, message: impl Into<String>) {
        let message = message.into();
        let row = notification::ActiveModel {
            user_id: Set(user_id),
            message: Set(message.clone()),
            status: Set(NotificationStatus::Unread),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Err(e) = row.insert(self.db_pool.as_ref()).await {
            warn!(user_id, error = %e, message, "failed to queue notification");
        }
    }

    /// Queues a message for the configured administrative user.
    pub async fn notify_admin(&self, message: impl Into<String>) {
        self.notify(self.admin_user_id, message).await;
    }

    /// Unread-first listing for a user, newest first within each group.
    pub async fn for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::Status)
            .order_by_desc(notification::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?)
    }

    /// Marks a notification as read.
    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<(), ServiceError> {
        let row = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("notification {}", notification_id)))?;

        let mut active: notification::ActiveModel = row.into();
        active.status = Set(NotificationStatus::Read);
        active.update(self.db_pool.as_ref()).await?;
        Ok(())
    }
}
