//! Repository for the `price_snapshots` table.

use sqlx::PgPool;

use cardvault_core::types::DbId;

use crate::models::price_snapshot::{NewPriceSnapshot, PriceSnapshot};

/// Column list for `price_snapshots` queries.
const COLUMNS: &str = "\
    id, card_id, near_mint, lightly_played, moderately_played, \
    heavily_played, graded, fetched_at, expires_at, created_at, updated_at";

/// Wholesale-replacement storage for per-card price snapshots.
pub struct PriceSnapshotRepo;

impl PriceSnapshotRepo {
    /// Replace a card's snapshot wholesale, keyed by `card_id`. Fields are
    /// never patched individually; the upsert overwrites every price
    /// column from the new payload.
    pub async fn upsert(
        pool: &PgPool,
        input: &NewPriceSnapshot,
    ) -> Result<PriceSnapshot, sqlx::Error> {
        let graded = serde_json::to_value(&input.graded)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        let query = format!(
            "INSERT INTO price_snapshots \
                (card_id, near_mint, lightly_played, moderately_played, \
                 heavily_played, graded, fetched_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (card_id) DO UPDATE SET \
                near_mint = EXCLUDED.near_mint, \
                lightly_played = EXCLUDED.lightly_played, \
                moderately_played = EXCLUDED.moderately_played, \
                heavily_played = EXCLUDED.heavily_played, \
                graded = EXCLUDED.graded, \
                fetched_at = EXCLUDED.fetched_at, \
                expires_at = EXCLUDED.expires_at, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriceSnapshot>(&query)
            .bind(input.card_id)
            .bind(input.raw.near_mint)
            .bind(input.raw.lightly_played)
            .bind(input.raw.moderately_played)
            .bind(input.raw.heavily_played)
            .bind(graded)
            .bind(input.fetched_at)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// The last known snapshot for a card, expired or not. Staleness is
    /// the caller's decision; this read never filters on `expires_at`.
    pub async fn find_by_card(
        pool: &PgPool,
        card_id: DbId,
    ) -> Result<Option<PriceSnapshot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM price_snapshots WHERE card_id = $1");
        sqlx::query_as::<_, PriceSnapshot>(&query)
            .bind(card_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a card's snapshot (used when upstream reports the card gone).
    pub async fn delete_for_card(pool: &PgPool, card_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM price_snapshots WHERE card_id = $1")
            .bind(card_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
