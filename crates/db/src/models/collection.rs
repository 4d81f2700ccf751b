//! Collection item model. The cache core only touches collections for
//! cost-basis lookups; CRUD beyond that belongs to the API layer.

use serde::Serialize;
use sqlx::FromRow;

use cardvault_core::types::{DbId, Timestamp};

/// A row from the `collection_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CollectionItem {
    pub id: DbId,
    pub user_id: DbId,
    pub card_id: DbId,
    pub grading_company: String,
    pub grade_key: String,
    pub quantity: i32,
    pub cost_basis: Option<f64>,
    pub acquired_on: Option<chrono::NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
