//! Repository for the `collection_items` table.
//!
//! The pricing core touches collections only through the read contract
//! "best-known price for (card, grade, date)"; item CRUD lives in the API
//! layer's domain.

use sqlx::PgPool;

use cardvault_core::types::{DbId, Timestamp};

use crate::models::collection::CollectionItem;
use crate::repositories::{PriceHistoryRepo, PriceSnapshotRepo};

/// Column list for `collection_items` queries.
const COLUMNS: &str = "\
    id, user_id, card_id, grading_company, grade_key, quantity, \
    cost_basis, acquired_on, created_at, updated_at";

/// Collection reads needed by valuation.
pub struct CollectionRepo;

impl CollectionRepo {
    /// A user's collection items.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<CollectionItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM collection_items WHERE user_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, CollectionItem>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Best-known price for a (card, grade) at a point in time: the latest
    /// history point at or before `at`, falling back to the current
    /// snapshot when the series has no point that old.
    pub async fn best_known_price(
        pool: &PgPool,
        card_id: DbId,
        grade_key: &str,
        at: Timestamp,
    ) -> Result<Option<f64>, sqlx::Error> {
        if let Some(point) =
            PriceHistoryRepo::latest_at_or_before(pool, card_id, grade_key, at).await?
        {
            return Ok(Some(point.price));
        }
        let snapshot = PriceSnapshotRepo::find_by_card(pool, card_id).await?;
        Ok(snapshot.and_then(|s| {
            if grade_key == cardvault_core::grading::RAW_GRADE_KEY {
                s.near_mint
            } else {
                s.graded_prices().get(grade_key).and_then(|g| g.average)
            }
        }))
    }
}
