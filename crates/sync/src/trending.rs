//! Trending score recomputation and the cached trending read path.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use cardvault_cache::TieredCache;
use cardvault_core::grading::RAW_GRADE_KEY;
use cardvault_core::trending::{change_percent_from_points, combined_score, components};
use cardvault_core::types::{DbId, Timestamp};
use cardvault_db::models::search_metric::MetricKind;
use cardvault_db::models::trending::{TrendingCard, TrendingFilter, UpsertTrendingScore};
use cardvault_db::repositories::{PriceHistoryRepo, SearchMetricRepo, TrendingRepo};

use crate::error::SyncError;
use crate::MAX_REPORTED_ERRORS;

/// Signals are derived over this trailing window.
const TRENDING_WINDOW_HOURS: i64 = 24;

/// Fast-tier key for the denormalized top-trending list.
const TOP_CACHE_KEY: &str = "trending:top";

/// The cached list is short-lived; a recompute refreshes it anyway.
const TOP_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Size of the cached top list.
const TOP_CACHE_SIZE: i64 = 20;

/// Counts returned by one recompute cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RecomputeOutcome {
    pub cards_scored: usize,
    pub failed: usize,
    /// At most [`MAX_REPORTED_ERRORS`] messages; `failed` counts them all.
    pub errors: Vec<String>,
}

/// Recomputes trending scores wholesale and serves trending reads.
pub struct TrendingEngine {
    pool: PgPool,
    cache: TieredCache,
}

impl TrendingEngine {
    pub fn new(pool: PgPool, cache: TieredCache) -> Self {
        Self { pool, cache }
    }

    /// Recompute the score of every card with recent price activity.
    /// Full replace per card, never an incremental adjustment; one card's
    /// failure never stops the cycle. Finishes by refreshing the cached
    /// top-N list.
    pub async fn recompute(&self) -> Result<RecomputeOutcome, SyncError> {
        let cutoff = Utc::now() - chrono::Duration::hours(TRENDING_WINDOW_HOURS);
        let card_ids = PriceHistoryRepo::card_ids_active_since(&self.pool, cutoff).await?;
        tracing::info!(candidates = card_ids.len(), "recomputing trending scores");

        let mut outcome = RecomputeOutcome {
            cards_scored: 0,
            failed: 0,
            errors: Vec::new(),
        };
        for card_id in card_ids {
            match self.score_card(card_id, cutoff).await {
                Ok(()) => outcome.cards_scored += 1,
                Err(e) => {
                    outcome.failed += 1;
                    if outcome.errors.len() < MAX_REPORTED_ERRORS {
                        outcome.errors.push(format!("card {card_id}: {e}"));
                    }
                    tracing::warn!(card_id, error = %e, "trending score failed; continuing");
                }
            }
        }

        let top = TrendingRepo::top(&self.pool, TOP_CACHE_SIZE, &TrendingFilter::default()).await?;
        self.cache.set_json(TOP_CACHE_KEY, &top, TOP_CACHE_TTL).await;

        tracing::info!(
            scored = outcome.cards_scored,
            failed = outcome.failed,
            "trending recompute finished"
        );
        Ok(outcome)
    }

    /// Top trending cards. Unfiltered reads hit the cached list first;
    /// filtered reads always go to the row store.
    pub async fn get_trending(
        &self,
        limit: i64,
        filter: &TrendingFilter,
    ) -> Result<Vec<TrendingCard>, SyncError> {
        let limit = limit.clamp(1, 100);
        if filter.is_empty() && limit <= TOP_CACHE_SIZE {
            if let Some(cached) = self.cache.get_json::<Vec<TrendingCard>>(TOP_CACHE_KEY).await {
                return Ok(cached.into_iter().take(limit as usize).collect());
            }
        }
        Ok(TrendingRepo::top(&self.pool, limit, filter).await?)
    }

    // ---- private helpers ----

    /// Derive and store one card's score: 24h percent change from the two
    /// most recent raw points (fewer than two points scores zero change),
    /// volume from the windowed history count, interest from the windowed
    /// search and social counts.
    async fn score_card(&self, card_id: DbId, cutoff: Timestamp) -> Result<(), SyncError> {
        let recent =
            PriceHistoryRepo::recent_prices(&self.pool, card_id, RAW_GRADE_KEY, 2).await?;
        let change_percent = change_percent_from_points(&recent);
        let volume = PriceHistoryRepo::count_since(&self.pool, card_id, cutoff).await?;
        let searches =
            SearchMetricRepo::count_since(&self.pool, card_id, MetricKind::Search, cutoff).await?;
        let social =
            SearchMetricRepo::count_since(&self.pool, card_id, MetricKind::Social, cutoff).await?;

        let parts = components(change_percent, volume as f64, searches as f64, social as f64);
        TrendingRepo::upsert(
            &self.pool,
            &UpsertTrendingScore {
                card_id,
                price_change_score: parts.price_change,
                volume_score: parts.volume,
                search_score: parts.searches,
                social_score: parts.social,
                combined_score: combined_score(&parts),
            },
        )
        .await?;
        Ok(())
    }
}
