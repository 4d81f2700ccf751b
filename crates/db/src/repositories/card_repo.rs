//! Repository for the `cards` table, including sync bookkeeping.

use sqlx::PgPool;

use cardvault_core::types::{DbId, Timestamp};

use crate::models::card::{Card, FetchState, UpsertCard};

/// Column list for `cards` queries.
const COLUMNS: &str = "\
    id, set_id, external_id, name, number, rarity, variant, image_url, \
    has_local_image, fetch_attempts, last_price_fetch_at, \
    created_at, updated_at";

/// CRUD and fetch-state bookkeeping for cards.
pub struct CardRepo;

impl CardRepo {
    /// Idempotent upsert keyed by the upstream `external_id`.
    pub async fn upsert(
        pool: &PgPool,
        set_id: DbId,
        input: &UpsertCard,
    ) -> Result<Card, sqlx::Error> {
        let query = format!(
            "INSERT INTO cards (set_id, external_id, name, number, rarity, variant, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (external_id) DO UPDATE SET \
                set_id = EXCLUDED.set_id, \
                name = EXCLUDED.name, \
                number = EXCLUDED.number, \
                rarity = EXCLUDED.rarity, \
                variant = EXCLUDED.variant, \
                image_url = EXCLUDED.image_url, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Card>(&query)
            .bind(set_id)
            .bind(&input.external_id)
            .bind(&input.name)
            .bind(&input.number)
            .bind(&input.rarity)
            .bind(&input.variant)
            .bind(&input.image_url)
            .fetch_one(pool)
            .await
    }

    /// Find a card by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Card>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cards WHERE id = $1");
        sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a card by its upstream identity.
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Card>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cards WHERE external_id = $1");
        sqlx::query_as::<_, Card>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Select cards whose prices are stale: never fetched, or fetched
    /// before `cutoff`. Oldest first so the longest-starved cards spend
    /// the batch budget. Cards without an upstream id cannot be synced
    /// and are excluded.
    pub async fn select_stale(
        pool: &PgPool,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<Card>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cards \
             WHERE external_id IS NOT NULL \
               AND (last_price_fetch_at IS NULL OR last_price_fetch_at < $1) \
             ORDER BY last_price_fetch_at ASC NULLS FIRST, id ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Card>(&query)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Increment the fetch-attempt counter DB-side. Two workers may still
    /// interleave with a read elsewhere; the counter is a soft retry
    /// heuristic, not a correctness-critical value.
    pub async fn record_fetch_attempt(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE cards SET fetch_attempts = fetch_attempts + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Stamp a successful price fetch.
    pub async fn mark_price_fetched(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE cards SET last_price_fetch_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Terminal success for the image asset: once set, image fetches stop
    /// regardless of the attempt count.
    pub async fn mark_image_cached(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE cards SET has_local_image = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Sync bookkeeping projection for one card.
    pub async fn fetch_state(pool: &PgPool, id: DbId) -> Result<Option<FetchState>, sqlx::Error> {
        sqlx::query_as::<_, FetchState>(
            "SELECT id AS card_id, external_id, fetch_attempts, last_price_fetch_at, \
                    has_local_image \
             FROM cards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Number of cards in a set (import verification).
    pub async fn count_in_set(pool: &PgPool, set_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cards WHERE set_id = $1")
            .bind(set_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
