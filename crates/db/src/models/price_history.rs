//! Price history points: the append-only series behind trending and
//! cost-basis lookups.

use serde::Serialize;
use sqlx::FromRow;

use cardvault_core::types::{DbId, Timestamp};

/// A row from the `price_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceHistoryPoint {
    pub id: DbId,
    pub card_id: DbId,
    /// Normalized grade key; `"raw"` for the near-mint raw series.
    pub grade_key: String,
    pub price: f64,
    pub recorded_at: Timestamp,
}

/// Insert payload for one history point.
#[derive(Debug, Clone)]
pub struct NewPricePoint {
    pub card_id: DbId,
    pub grade_key: String,
    pub price: f64,
}
