//! Typed persistence layer: one model and one repository per table.
//!
//! Repositories are stateless structs with associated async functions over
//! `&PgPool`. Writes that may race across worker instances are idempotent
//! upserts keyed by natural unique keys, never surrogate ids.

pub mod models;
pub mod repositories;

use sqlx::PgPool;

/// Cheap connectivity probe used by worker startup.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
