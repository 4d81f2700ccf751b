//! Repository for the `trending_scores` table and the trending read model.

use sqlx::PgPool;

use crate::models::trending::{TrendingCard, TrendingFilter, TrendingScore, UpsertTrendingScore};

/// Column list for `trending_scores` queries.
const COLUMNS: &str = "\
    id, card_id, price_change_score, volume_score, search_score, \
    social_score, combined_score, computed_at";

/// Wholesale per-cycle storage for trending scores.
pub struct TrendingRepo;

impl TrendingRepo {
    /// Replace a card's score, keyed by `card_id`. Scores are recomputed
    /// from scratch each cycle, never incrementally adjusted.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertTrendingScore,
    ) -> Result<TrendingScore, sqlx::Error> {
        let query = format!(
            "INSERT INTO trending_scores \
                (card_id, price_change_score, volume_score, search_score, \
                 social_score, combined_score, computed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             ON CONFLICT (card_id) DO UPDATE SET \
                price_change_score = EXCLUDED.price_change_score, \
                volume_score = EXCLUDED.volume_score, \
                search_score = EXCLUDED.search_score, \
                social_score = EXCLUDED.social_score, \
                combined_score = EXCLUDED.combined_score, \
                computed_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrendingScore>(&query)
            .bind(input.card_id)
            .bind(input.price_change_score)
            .bind(input.volume_score)
            .bind(input.search_score)
            .bind(input.social_score)
            .bind(input.combined_score)
            .fetch_one(pool)
            .await
    }

    /// Find one card's score.
    pub async fn find_by_card(
        pool: &PgPool,
        card_id: i64,
    ) -> Result<Option<TrendingScore>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM trending_scores WHERE card_id = $1");
        sqlx::query_as::<_, TrendingScore>(&query)
            .bind(card_id)
            .fetch_optional(pool)
            .await
    }

    /// The top trending cards joined with card identity and the current
    /// near-mint price, highest score first.
    pub async fn top(
        pool: &PgPool,
        limit: i64,
        filter: &TrendingFilter,
    ) -> Result<Vec<TrendingCard>, sqlx::Error> {
        sqlx::query_as::<_, TrendingCard>(
            "SELECT t.card_id, c.name, s.name AS set_name, c.number, c.rarity, \
                    c.image_url, t.combined_score, t.price_change_score, p.near_mint \
             FROM trending_scores t \
             JOIN cards c ON c.id = t.card_id \
             LEFT JOIN sets s ON s.id = c.set_id \
             LEFT JOIN price_snapshots p ON p.card_id = t.card_id \
             WHERE ($2::BIGINT IS NULL OR c.set_id = $2) \
               AND ($3::TEXT IS NULL OR c.rarity = $3) \
             ORDER BY t.combined_score DESC, t.card_id ASC \
             LIMIT $1",
        )
        .bind(limit)
        .bind(filter.set_id)
        .bind(&filter.rarity)
        .fetch_all(pool)
        .await
    }
}
