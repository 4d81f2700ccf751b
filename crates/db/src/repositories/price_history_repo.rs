//! Repository for the `price_history` table.

use sqlx::PgPool;

use cardvault_core::types::{DbId, Timestamp};

use crate::models::price_history::{NewPricePoint, PriceHistoryPoint};

/// Column list for `price_history` queries.
const COLUMNS: &str = "id, card_id, grade_key, price, recorded_at";

/// Append-only price series.
pub struct PriceHistoryRepo;

impl PriceHistoryRepo {
    /// Append one price point.
    pub async fn insert(
        pool: &PgPool,
        point: &NewPricePoint,
    ) -> Result<PriceHistoryPoint, sqlx::Error> {
        let query = format!(
            "INSERT INTO price_history (card_id, grade_key, price) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriceHistoryPoint>(&query)
            .bind(point.card_id)
            .bind(&point.grade_key)
            .bind(point.price)
            .fetch_one(pool)
            .await
    }

    /// The most recent prices for one card's grade series, newest first.
    /// The trending job reads two points to derive the 24h change.
    pub async fn recent_prices(
        pool: &PgPool,
        card_id: DbId,
        grade_key: &str,
        limit: i64,
    ) -> Result<Vec<f64>, sqlx::Error> {
        let rows: Vec<(f64,)> = sqlx::query_as(
            "SELECT price FROM price_history \
             WHERE card_id = $1 AND grade_key = $2 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT $3",
        )
        .bind(card_id)
        .bind(grade_key)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(p,)| p).collect())
    }

    /// Count history points for a card since `cutoff` (trending volume).
    pub async fn count_since(
        pool: &PgPool,
        card_id: DbId,
        cutoff: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM price_history WHERE card_id = $1 AND recorded_at >= $2",
        )
        .bind(card_id)
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Cards with any history since `cutoff`: the trending recompute set.
    pub async fn card_ids_active_since(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT DISTINCT card_id FROM price_history WHERE recorded_at >= $1",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The latest point at or before `at` for a card's grade series.
    /// Cost-basis lookups use this before falling back to the current
    /// snapshot.
    pub async fn latest_at_or_before(
        pool: &PgPool,
        card_id: DbId,
        grade_key: &str,
        at: Timestamp,
    ) -> Result<Option<PriceHistoryPoint>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM price_history \
             WHERE card_id = $1 AND grade_key = $2 AND recorded_at <= $3 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, PriceHistoryPoint>(&query)
            .bind(card_id)
            .bind(grade_key)
            .bind(at)
            .fetch_optional(pool)
            .await
    }
}
