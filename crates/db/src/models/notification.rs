//! Notification queue rows. Delivery transport lives elsewhere; this table
//! is a fire-and-forget queue the alert engine appends to.

use serde::Serialize;
use sqlx::FromRow;

use cardvault_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub alert_id: Option<DbId>,
    pub card_id: Option<DbId>,
    pub delivery_method: String,
    pub subject: String,
    pub body: String,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
}

/// Enqueue payload. Each alert firing produces exactly one of these.
#[derive(Debug, Clone)]
pub struct EnqueueNotification {
    pub user_id: DbId,
    pub alert_id: Option<DbId>,
    pub card_id: Option<DbId>,
    pub delivery_method: String,
    pub subject: String,
    pub body: String,
}
