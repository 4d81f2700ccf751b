//! Set entity models and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cardvault_core::types::{DbId, Timestamp};

/// A row from the `sets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Set {
    pub id: DbId,
    pub external_id: String,
    pub name: String,
    pub series: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub total_cards: Option<i32>,
    /// Set once the full member import has completed. Re-imports move it
    /// forward, never backward.
    pub imported_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Upsert payload for a set discovered in the upstream listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSet {
    pub external_id: String,
    pub name: String,
    pub series: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub total_cards: Option<i32>,
}
