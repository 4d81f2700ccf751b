//! Trending score rows and the denormalized trending-card read model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cardvault_core::types::{DbId, Timestamp};

/// A row from the `trending_scores` table. Replaced wholesale each cycle.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrendingScore {
    pub id: DbId,
    pub card_id: DbId,
    pub price_change_score: f64,
    pub volume_score: f64,
    pub search_score: f64,
    pub social_score: f64,
    pub combined_score: f64,
    pub computed_at: Timestamp,
}

/// Upsert payload for one card's recomputed score.
#[derive(Debug, Clone)]
pub struct UpsertTrendingScore {
    pub card_id: DbId,
    pub price_change_score: f64,
    pub volume_score: f64,
    pub search_score: f64,
    pub social_score: f64,
    pub combined_score: f64,
}

/// Read-optimized trending entry: score joined with card identity and the
/// current near-mint price. Cached as JSON with a short TTL, so it is
/// serializable both ways.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TrendingCard {
    pub card_id: DbId,
    pub name: String,
    pub set_name: Option<String>,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub combined_score: f64,
    pub price_change_score: f64,
    pub near_mint: Option<f64>,
}

/// Optional filters for trending reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingFilter {
    /// Restrict to one set.
    pub set_id: Option<DbId>,
    /// Restrict to a rarity string as stored on the card.
    pub rarity: Option<String>,
}

impl TrendingFilter {
    /// True when no filter is set (the cached top-N list applies).
    pub fn is_empty(&self) -> bool {
        self.set_id.is_none() && self.rarity.is_none()
    }
}
