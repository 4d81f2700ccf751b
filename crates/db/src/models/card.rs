//! Card entity models, DTOs, and the per-card fetch-state projection.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cardvault_core::types::{DbId, Timestamp};

/// A row from the `cards` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Card {
    pub id: DbId,
    pub set_id: Option<DbId>,
    /// Upstream feed identity. `None` for user-created cards, which are
    /// excluded from price sync.
    pub external_id: Option<String>,
    pub name: String,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub variant: Option<String>,
    pub image_url: Option<String>,
    pub has_local_image: bool,
    pub fetch_attempts: i32,
    pub last_price_fetch_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Upsert payload for a card arriving from the upstream feed.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCard {
    pub external_id: String,
    pub name: String,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub variant: Option<String>,
    pub image_url: Option<String>,
}

/// Sync bookkeeping projection of a card row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FetchState {
    pub card_id: DbId,
    pub external_id: Option<String>,
    /// Monotone within a retry window. Incremented DB-side; concurrent
    /// workers may still interleave increments (accepted soft heuristic).
    pub fetch_attempts: i32,
    pub last_price_fetch_at: Option<Timestamp>,
    /// Terminal success marker for the image asset: once true, no further
    /// image fetches happen regardless of the attempt count.
    pub has_local_image: bool,
}
