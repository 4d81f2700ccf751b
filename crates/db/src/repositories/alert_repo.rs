//! Repository for the `price_alerts` table.

use sqlx::PgPool;

use cardvault_core::types::DbId;

use crate::models::alert::{ActiveAlert, CreateAlert, PriceAlert};

/// Column list for `price_alerts` queries.
const COLUMNS: &str = "\
    id, user_id, card_id, grading_company, grade_key, threshold_percent, \
    direction, baseline_price, is_active, delivery_method, \
    last_triggered_at, trigger_count, created_at, updated_at";

/// CRUD and trigger bookkeeping for price alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Create an alert. `baseline_price` is seeded by the caller from the
    /// best currently-known price; `None` when the card has no snapshot
    /// yet (the alert stays dormant until a price exists).
    pub async fn create(
        pool: &PgPool,
        input: &CreateAlert,
        grade_key: &str,
        baseline_price: Option<f64>,
    ) -> Result<PriceAlert, sqlx::Error> {
        let query = format!(
            "INSERT INTO price_alerts \
                (user_id, card_id, grading_company, grade_key, \
                 threshold_percent, direction, baseline_price, delivery_method) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriceAlert>(&query)
            .bind(input.user_id)
            .bind(input.card_id)
            .bind(input.grading_company.as_str())
            .bind(grade_key)
            .bind(input.threshold_percent)
            .bind(input.direction.as_str())
            .bind(baseline_price)
            .bind(input.delivery_method.as_deref().unwrap_or("email"))
            .fetch_one(pool)
            .await
    }

    /// Find an alert by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PriceAlert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM price_alerts WHERE id = $1");
        sqlx::query_as::<_, PriceAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's alerts, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PriceAlert>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM price_alerts WHERE user_id = $1 ORDER BY id DESC");
        sqlx::query_as::<_, PriceAlert>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// All active alerts joined with their card's current snapshot.
    /// Snapshot columns come back null for cards without one; the alert
    /// engine skips those rather than erroring.
    pub async fn active_with_prices(pool: &PgPool) -> Result<Vec<ActiveAlert>, sqlx::Error> {
        sqlx::query_as::<_, ActiveAlert>(
            "SELECT a.id, a.user_id, a.card_id, c.name AS card_name, \
                    a.grading_company, a.grade_key, a.threshold_percent, \
                    a.direction, a.baseline_price, a.delivery_method, \
                    p.near_mint, p.graded \
             FROM price_alerts a \
             JOIN cards c ON c.id = a.card_id \
             LEFT JOIN price_snapshots p ON p.card_id = a.card_id \
             WHERE a.is_active \
             ORDER BY a.id ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// Trigger bookkeeping: reset the baseline to the firing price, bump
    /// the counter, stamp the trigger time. This is what makes alerts
    /// edge-triggered against a moving reference.
    pub async fn mark_triggered(
        pool: &PgPool,
        id: DbId,
        new_baseline: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE price_alerts \
             SET baseline_price = $2, trigger_count = trigger_count + 1, \
                 last_triggered_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(new_baseline)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Seed the baseline of a dormant alert once a price first exists.
    pub async fn seed_baseline(pool: &PgPool, id: DbId, baseline: f64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE price_alerts SET baseline_price = $2, updated_at = NOW() \
             WHERE id = $1 AND baseline_price IS NULL",
        )
        .bind(id)
        .bind(baseline)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Flip the active flag, returning the updated row.
    pub async fn toggle(pool: &PgPool, id: DbId) -> Result<Option<PriceAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE price_alerts SET is_active = NOT is_active, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriceAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete an alert, scoped to its owner. Returns whether a row
    /// was removed.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM price_alerts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
