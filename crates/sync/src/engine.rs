//! The price sync engine: coalesced interactive reads, batched background
//! sync, and set imports.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use sqlx::PgPool;

use cardvault_cache::{CoalesceError, Coalescer, TieredCache};
use cardvault_core::pricing::TTL_MEDIUM;
use cardvault_core::ranking;
use cardvault_core::types::DbId;
use cardvault_db::models::card::{Card, UpsertCard};
use cardvault_db::models::price_snapshot::PriceSnapshot;
use cardvault_db::models::set::{Set, UpsertSet};
use cardvault_db::repositories::{
    CardRepo, PriceHistoryRepo, PriceSnapshotRepo, SetRepo,
};
use cardvault_pricefeed::{PriceFeed, PriceFeedError, SetPayload};

use crate::error::SyncError;
use crate::transform;
use crate::MAX_REPORTED_ERRORS;

/// Cards count as stale once their last fetch is older than this.
pub const STALENESS_THRESHOLD_HOURS: i64 = 24;

/// Hard cap on one batch-sync invocation, protecting the credit budget.
pub const MAX_BATCH_SIZE: i64 = 50;

/// Cards fetched concurrently between cooperative delays.
const SUB_BATCH_SIZE: usize = 5;

/// Cooperative pause between sub-batches, keeping the upstream rate happy.
const INTER_BATCH_DELAY: Duration = Duration::from_secs(1);

/// Fast-tier key for a card's price snapshot.
fn price_cache_key(card_id: DbId) -> String {
    format!("price:card:{card_id}")
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Options for [`PriceSyncEngine::get_with_prices`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceOptions {
    /// Skip the cache and coalescer; fetch and persist directly.
    pub force_refresh: bool,
    /// Include graded aggregates in the response. The stored snapshot
    /// always keeps them; this only trims the returned payload.
    pub include_graded: bool,
}

/// A card with its best-known prices and the freshness of that knowledge.
#[derive(Debug, Clone, Serialize)]
pub struct PricedCard {
    pub card: Card,
    pub snapshot: Option<PriceSnapshot>,
    /// True when the snapshot came from the cache or the row store rather
    /// than a fresh upstream fetch.
    pub from_cache: bool,
    /// Hours since the snapshot was fetched, set only on the stale
    /// fallback path.
    pub stale_hours: Option<f64>,
}

/// Counts returned by one batch-sync invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub updated: usize,
    pub failed: usize,
    /// At most [`MAX_REPORTED_ERRORS`] messages; `failed` counts them all.
    pub errors: Vec<String>,
}

/// Result of a completed set import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub set: Set,
    pub cards_imported: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates upstream fetches, normalization, and write-through to the
/// cache and row store. Constructed once at process start and shared.
pub struct PriceSyncEngine {
    pool: PgPool,
    cache: TieredCache,
    coalescer: Coalescer<PriceSnapshot, SyncError>,
    feed: Arc<dyn PriceFeed>,
}

impl PriceSyncEngine {
    pub fn new(pool: PgPool, cache: TieredCache, feed: Arc<dyn PriceFeed>) -> Self {
        Self {
            pool,
            coalescer: Coalescer::new(cache.clone()),
            cache,
            feed,
        }
    }

    /// Interactive read path. Never hard-fails while any snapshot exists:
    /// cache hit, coalesced fetch, then stale row-store fallback tagged
    /// with its age. Only when the card has never been priced does the
    /// fetch error surface.
    pub async fn get_with_prices(
        &self,
        card_id: DbId,
        opts: PriceOptions,
    ) -> Result<PricedCard, SyncError> {
        let card = CardRepo::find_by_id(&self.pool, card_id)
            .await?
            .ok_or(SyncError::UnknownCard(card_id))?;
        let key = price_cache_key(card_id);

        if opts.force_refresh {
            let snapshot = self.fetch_and_store(&card).await?;
            self.cache.set_json(&key, &snapshot, TTL_MEDIUM).await;
            return Ok(Self::priced(card, snapshot, false, None, opts));
        }

        if let Some(snapshot) = self.cache.get_json::<PriceSnapshot>(&key).await {
            return Ok(Self::priced(card, snapshot, true, None, opts));
        }

        let fetched = self
            .coalescer
            .coalesce(&key, TTL_MEDIUM, || self.fetch_and_store(&card))
            .await;

        match fetched {
            Ok(snapshot) => Ok(Self::priced(card, snapshot, false, None, opts)),
            Err(err) => {
                let err = match err {
                    CoalesceError::Producer(e) => e,
                    CoalesceError::Abandoned => SyncError::Interrupted,
                };
                tracing::warn!(card_id, error = %err, "price fetch failed; trying stale snapshot");
                match PriceSnapshotRepo::find_by_card(&self.pool, card_id).await? {
                    Some(snapshot) => {
                        let stale_hours = snapshot.age_hours(Utc::now());
                        tracing::info!(card_id, stale_hours, "serving stale prices");
                        Ok(Self::priced(card, snapshot, true, Some(stale_hours), opts))
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Batch path for the scheduler: fetch every card whose prices are
    /// stale, oldest first, in rate-limited sub-batches. One card's
    /// failure never blocks the rest; credential-class failures abort the
    /// whole job instead of failing every item identically.
    pub async fn sync_stale_cards(&self, batch_size: i64) -> Result<SyncOutcome, SyncError> {
        let cutoff = Utc::now() - chrono::Duration::hours(STALENESS_THRESHOLD_HOURS);
        let limit = batch_size.clamp(1, MAX_BATCH_SIZE);
        let stale = CardRepo::select_stale(&self.pool, cutoff, limit).await?;
        tracing::info!(candidates = stale.len(), limit, "starting stale price sync");

        let mut outcome = SyncOutcome {
            updated: 0,
            failed: 0,
            errors: Vec::new(),
        };

        for (index, chunk) in stale.chunks(SUB_BATCH_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(INTER_BATCH_DELAY).await;
            }

            let results = join_all(chunk.iter().map(|card| async move {
                let result = self.fetch_and_store(card).await;
                (card, result)
            }))
            .await;

            for (card, result) in results {
                match result {
                    Ok(snapshot) => {
                        self.cache
                            .set_json(&price_cache_key(card.id), &snapshot, TTL_MEDIUM)
                            .await;
                        outcome.updated += 1;
                    }
                    Err(SyncError::Feed(
                        e @ (PriceFeedError::Unauthorized | PriceFeedError::MissingCredentials),
                    )) => {
                        tracing::error!(error = %e, "credential failure; aborting batch");
                        return Err(SyncError::Config(e.to_string()));
                    }
                    Err(e) => {
                        outcome.failed += 1;
                        if outcome.errors.len() < MAX_REPORTED_ERRORS {
                            outcome.errors.push(format!("card {} ({}): {e}", card.id, card.name));
                        }
                        tracing::warn!(card_id = card.id, error = %e, "card sync failed; continuing");
                    }
                }
            }
        }

        tracing::info!(
            updated = outcome.updated,
            failed = outcome.failed,
            "stale price sync finished"
        );
        Ok(outcome)
    }

    /// Import a set and all its member cards. Idempotent: upserts are
    /// keyed by upstream ids, and the terminal `imported_at` stamp only
    /// moves forward, so re-running after a crash is always safe.
    pub async fn import_set(&self, external_set_id: &str) -> Result<ImportOutcome, SyncError> {
        let listing = self.feed.get_sets().await?;
        let payload = listing
            .into_iter()
            .find(|s| s.id == external_set_id)
            .ok_or_else(|| {
                SyncError::Feed(PriceFeedError::NotFound(external_set_id.to_string()))
            })?;

        let set = SetRepo::upsert(
            &self.pool,
            &UpsertSet {
                external_id: payload.id,
                name: payload.name,
                series: payload.series,
                release_date: payload
                    .release_date
                    .as_deref()
                    .and_then(|d| d.parse().ok()),
                total_cards: payload.total_cards,
            },
        )
        .await?;

        let cards = self.feed.get_cards_by_set(external_set_id).await?;
        let mut imported = 0;
        for card in &cards {
            CardRepo::upsert(
                &self.pool,
                set.id,
                &UpsertCard {
                    external_id: card.id.clone(),
                    name: card.name.clone(),
                    number: card.number.clone(),
                    rarity: card.rarity.clone(),
                    variant: card.variant.clone(),
                    image_url: card.image_url.clone(),
                },
            )
            .await?;
            imported += 1;
        }

        let set = SetRepo::mark_imported(&self.pool, set.id).await?;
        tracing::info!(set_id = set.id, cards = imported, "set import complete");
        Ok(ImportOutcome {
            set,
            cards_imported: imported,
        })
    }

    /// Order upstream sets for import by priority: high-value vintage
    /// first, modern chase second, the rest by recency. Deterministic, so
    /// replanning yields the same order.
    pub fn rank_sets_for_import(sets: Vec<SetPayload>) -> Vec<SetPayload> {
        let mut indexed: Vec<(SetPayload, String, usize)> = sets
            .into_iter()
            .enumerate()
            .map(|(index, set)| {
                let name = set.name.clone();
                (set, name, index)
            })
            .collect();
        ranking::rank_for_import(&mut indexed);
        indexed.into_iter().map(|(set, _, _)| set).collect()
    }

    // ---- private helpers ----

    /// Fetch, normalize, and persist one card's prices. The attempt is
    /// recorded before the upstream call; the fetch stamp only lands on
    /// success. An all-null payload leaves any prior snapshot in place
    /// and reports [`SyncError::NoPriceData`].
    async fn fetch_and_store(&self, card: &Card) -> Result<PriceSnapshot, SyncError> {
        let external_id = card
            .external_id
            .as_deref()
            .ok_or(SyncError::UnknownCard(card.id))?;

        CardRepo::record_fetch_attempt(&self.pool, card.id).await?;
        let payload = self.feed.get_card(external_id, true).await?;
        let fetched_at = Utc::now();

        let Some(new_snapshot) = transform::snapshot_from_payload(card.id, &payload, fetched_at)
        else {
            // Successful fetch, nothing priced: stamp the fetch so the
            // batch does not hammer priceless bulk, keep the old snapshot.
            CardRepo::mark_price_fetched(&self.pool, card.id).await?;
            return Err(SyncError::NoPriceData(card.id));
        };

        let snapshot = PriceSnapshotRepo::upsert(&self.pool, &new_snapshot).await?;
        for point in transform::history_points(&new_snapshot) {
            PriceHistoryRepo::insert(&self.pool, &point).await?;
        }
        CardRepo::mark_price_fetched(&self.pool, card.id).await?;
        Ok(snapshot)
    }

    fn priced(
        card: Card,
        mut snapshot: PriceSnapshot,
        from_cache: bool,
        stale_hours: Option<f64>,
        opts: PriceOptions,
    ) -> PricedCard {
        if !opts.include_graded {
            snapshot.graded = serde_json::Value::Object(Default::default());
        }
        PricedCard {
            card,
            snapshot: Some(snapshot),
            from_cache,
            stale_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_prefers_vintage_then_chase_then_recency() {
        let sets = vec![
            SetPayload {
                id: "sv5".into(),
                name: "Temporal Forces".into(),
                series: None,
                release_date: None,
                total_cards: None,
            },
            SetPayload {
                id: "swsh7".into(),
                name: "Evolving Skies".into(),
                series: None,
                release_date: None,
                total_cards: None,
            },
            SetPayload {
                id: "base2".into(),
                name: "Jungle".into(),
                series: None,
                release_date: None,
                total_cards: None,
            },
        ];
        let ranked = PriceSyncEngine::rank_sets_for_import(sets);
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["base2", "swsh7", "sv5"]);
    }
}
