//! Repository for the `notifications` queue table.

use sqlx::PgPool;

use cardvault_core::types::DbId;

use crate::models::notification::{EnqueueNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "\
    id, user_id, alert_id, card_id, delivery_method, subject, body, \
    created_at, sent_at";

/// Fire-and-forget notification queue. Delivery is another service's job.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Append one notification row.
    pub async fn enqueue(
        pool: &PgPool,
        input: &EnqueueNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                (user_id, alert_id, card_id, delivery_method, subject, body) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.alert_id)
            .bind(input.card_id)
            .bind(&input.delivery_method)
            .bind(&input.subject)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
