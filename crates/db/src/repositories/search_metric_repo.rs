//! Repository for the `search_metrics` table.

use sqlx::PgPool;

use cardvault_core::types::{DbId, Timestamp};

use crate::models::search_metric::MetricKind;

/// Windowed interest counts for the trending job.
pub struct SearchMetricRepo;

impl SearchMetricRepo {
    /// Record one interest event (a search hit or a social mention).
    pub async fn record(pool: &PgPool, card_id: DbId, kind: MetricKind) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO search_metrics (card_id, kind) VALUES ($1, $2)")
            .bind(card_id)
            .bind(kind.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Count events of one kind for a card since `cutoff`.
    pub async fn count_since(
        pool: &PgPool,
        card_id: DbId,
        kind: MetricKind,
        cutoff: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM search_metrics \
             WHERE card_id = $1 AND kind = $2 AND occurred_at >= $3",
        )
        .bind(card_id)
        .bind(kind.as_str())
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
