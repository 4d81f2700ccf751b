//! Repository for the `sets` table.

use sqlx::PgPool;

use cardvault_core::types::DbId;

use crate::models::set::{Set, UpsertSet};

/// Column list for `sets` queries.
const COLUMNS: &str = "\
    id, external_id, name, series, release_date, total_cards, \
    imported_at, created_at, updated_at";

/// CRUD and import bookkeeping for sets.
pub struct SetRepo;

impl SetRepo {
    /// Idempotent upsert keyed by the upstream `external_id`.
    pub async fn upsert(pool: &PgPool, input: &UpsertSet) -> Result<Set, sqlx::Error> {
        let query = format!(
            "INSERT INTO sets (external_id, name, series, release_date, total_cards) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (external_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                series = EXCLUDED.series, \
                release_date = EXCLUDED.release_date, \
                total_cards = EXCLUDED.total_cards, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Set>(&query)
            .bind(&input.external_id)
            .bind(&input.name)
            .bind(&input.series)
            .bind(input.release_date)
            .bind(input.total_cards)
            .fetch_one(pool)
            .await
    }

    /// Find a set by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Set>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sets WHERE id = $1");
        sqlx::query_as::<_, Set>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a set by its upstream identity.
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Set>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sets WHERE external_id = $1");
        sqlx::query_as::<_, Set>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Stamp a completed import. `NOW()` only ever moves forward, so
    /// re-running an import keeps the timestamp monotonically
    /// non-decreasing.
    pub async fn mark_imported(pool: &PgPool, id: DbId) -> Result<Set, sqlx::Error> {
        let query = format!(
            "UPDATE sets SET imported_at = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Set>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// List all sets, newest release first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Set>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sets ORDER BY release_date DESC NULLS LAST, id DESC"
        );
        sqlx::query_as::<_, Set>(&query).fetch_all(pool).await
    }
}
