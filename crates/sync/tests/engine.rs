//! Integration tests for the price sync engine: the cache-aside read
//! path, stale fallback, batch resilience, and set import idempotence.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use cardvault_cache::{MemoryTier, TieredCache};
use cardvault_core::pricing::RawPrices;
use cardvault_db::models::price_snapshot::NewPriceSnapshot;
use cardvault_db::repositories::{CardRepo, PriceSnapshotRepo};
use cardvault_pricefeed::PriceFeedError;
use cardvault_sync::{PriceOptions, PriceSyncEngine, SyncError};

use common::{priceless_payload, raw_payload, seed_card, set_payload, ScriptedFeed};

fn build_engine(pool: &PgPool, feed: Arc<ScriptedFeed>) -> (PriceSyncEngine, TieredCache) {
    let cache = TieredCache::new(Arc::new(MemoryTier::new()));
    let engine = PriceSyncEngine::new(pool.clone(), cache.clone(), feed);
    (engine, cache)
}

async fn insert_stale_snapshot(pool: &PgPool, card_id: i64, near_mint: f64, age_hours: i64) {
    let fetched_at = Utc::now() - Duration::hours(age_hours);
    PriceSnapshotRepo::upsert(
        pool,
        &NewPriceSnapshot {
            card_id,
            raw: RawPrices {
                near_mint: Some(near_mint),
                ..Default::default()
            },
            graded: Default::default(),
            fetched_at,
            expires_at: fetched_at + Duration::hours(2),
        },
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn fresh_fetch_then_cache_hit(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    feed.put_card(raw_payload("swsh7-215", "Rayquaza VMAX", 120.0));
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    let (engine, _cache) = build_engine(&pool, Arc::clone(&feed));

    let first = engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.stale_hours, None);
    assert_eq!(first.snapshot.as_ref().unwrap().near_mint, Some(120.0));

    let second = engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(feed.card_calls.load(Ordering::SeqCst), 1);

    // A successful fetch stamps the card's bookkeeping.
    let state = CardRepo::fetch_state(&pool, card.id).await.unwrap().unwrap();
    assert_eq!(state.fetch_attempts, 1);
    assert!(state.last_price_fetch_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn force_refresh_bypasses_cache(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    feed.put_card(raw_payload("swsh7-215", "Rayquaza VMAX", 120.0));
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    let (engine, _cache) = build_engine(&pool, Arc::clone(&feed));

    engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap();

    // Upstream moves; the cached entry still says 120.
    feed.put_card(raw_payload("swsh7-215", "Rayquaza VMAX", 150.0));
    let cached = engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap();
    assert_eq!(cached.snapshot.as_ref().unwrap().near_mint, Some(120.0));

    let forced = engine
        .get_with_prices(
            card.id,
            PriceOptions {
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!forced.from_cache);
    assert_eq!(forced.snapshot.as_ref().unwrap().near_mint, Some(150.0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn upstream_failure_falls_back_to_stale_snapshot(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    feed.fail_card("swsh7-215");
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    insert_stale_snapshot(&pool, card.id, 99.0, 10).await;
    let (engine, _cache) = build_engine(&pool, feed);

    let priced = engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap();
    assert!(priced.from_cache);
    assert_eq!(priced.snapshot.as_ref().unwrap().near_mint, Some(99.0));
    let stale_hours = priced.stale_hours.unwrap();
    assert!((stale_hours - 10.0).abs() < 0.1, "stale_hours = {stale_hours}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn upstream_failure_without_snapshot_surfaces_the_error(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    feed.fail_card("swsh7-215");
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    let (engine, _cache) = build_engine(&pool, feed);

    let err = engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, SyncError::Feed(PriceFeedError::Request(_)));
    assert!(err.is_retryable());
}

#[sqlx::test(migrations = "../../migrations")]
async fn priceless_payload_keeps_prior_snapshot(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    feed.put_card(priceless_payload("swsh7-215", "Rayquaza VMAX"));
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    insert_stale_snapshot(&pool, card.id, 80.0, 5).await;
    let (engine, _cache) = build_engine(&pool, feed);

    // The fetch succeeds but yields nothing priced; the old snapshot is
    // served stale instead of being replaced by an empty one.
    let priced = engine
        .get_with_prices(card.id, PriceOptions::default())
        .await
        .unwrap();
    assert!(priced.from_cache);
    assert_eq!(priced.snapshot.as_ref().unwrap().near_mint, Some(80.0));

    let stored = PriceSnapshotRepo::find_by_card(&pool, card.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.near_mint, Some(80.0));
}

// ---------------------------------------------------------------------------
// Batch sync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn one_bad_card_does_not_sink_the_batch(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    for i in 1..=10 {
        let ext = format!("swsh7-{i}");
        let name = format!("Card {i}");
        feed.put_card(raw_payload(&ext, &name, 10.0 * i as f64));
        seed_card(&pool, &ext, &name).await;
    }
    feed.fail_card("swsh7-5");
    let (engine, _cache) = build_engine(&pool, feed);

    let outcome = engine.sync_stale_cards(10).await.unwrap();
    assert_eq!(outcome.updated, 9);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("Card 5"), "{:?}", outcome.errors);

    // The failed card stays stale and is picked up next cycle.
    let stale = CardRepo::select_stale(&pool, Utc::now() - Duration::hours(24), 50)
        .await
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].external_id.as_deref(), Some("swsh7-5"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn credential_failure_aborts_the_whole_batch(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    for i in 1..=3 {
        let ext = format!("swsh7-{i}");
        seed_card(&pool, &ext, &format!("Card {i}")).await;
    }
    feed.fail_all(PriceFeedError::Unauthorized);
    let (engine, _cache) = build_engine(&pool, feed);

    let err = engine.sync_stale_cards(10).await.unwrap_err();
    assert_matches!(err, SyncError::Config(_));
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn import_set_is_idempotent(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    feed.put_set(
        set_payload("swsh7", "Evolving Skies"),
        vec![
            raw_payload("swsh7-1", "Card 1", 1.0),
            raw_payload("swsh7-2", "Card 2", 2.0),
            raw_payload("swsh7-3", "Card 3", 3.0),
        ],
    );
    let (engine, _cache) = build_engine(&pool, feed);

    let first = engine.import_set("swsh7").await.unwrap();
    assert_eq!(first.cards_imported, 3);
    let first_stamp = first.set.imported_at.unwrap();

    let second = engine.import_set("swsh7").await.unwrap();
    assert_eq!(second.cards_imported, 3);
    assert_eq!(second.set.id, first.set.id);
    assert!(second.set.imported_at.unwrap() >= first_stamp);

    // Re-running produced no duplicate rows.
    assert_eq!(
        CardRepo::count_in_set(&pool, first.set.id).await.unwrap(),
        3
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_of_unknown_set_is_not_found(pool: PgPool) {
    let feed = Arc::new(ScriptedFeed::new());
    let (engine, _cache) = build_engine(&pool, feed);

    let err = engine.import_set("nope").await.unwrap_err();
    assert_matches!(err, SyncError::Feed(PriceFeedError::NotFound(_)));
}
