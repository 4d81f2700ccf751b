//! Integration tests for the trending recompute cycle and read path.

mod common;

use std::sync::Arc;

use sqlx::PgPool;

use cardvault_cache::{MemoryTier, TieredCache};
use cardvault_db::models::price_history::NewPricePoint;
use cardvault_db::models::search_metric::MetricKind;
use cardvault_db::models::trending::{TrendingCard, TrendingFilter};
use cardvault_db::repositories::{PriceHistoryRepo, SearchMetricRepo, TrendingRepo};
use cardvault_sync::TrendingEngine;

use common::seed_card;

async fn push_price(pool: &PgPool, card_id: i64, price: f64) {
    PriceHistoryRepo::insert(
        pool,
        &NewPricePoint {
            card_id,
            grade_key: "raw".to_string(),
            price,
        },
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../migrations")]
async fn recompute_scores_active_cards(pool: PgPool) {
    let mover = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    let sleeper = seed_card(&pool, "swsh7-216", "Duraludon VMAX").await;
    let cache = TieredCache::new(Arc::new(MemoryTier::new()));
    let engine = TrendingEngine::new(pool.clone(), cache.clone());

    // Mover: +15% across two points, plus search and social interest.
    push_price(&pool, mover.id, 100.0).await;
    push_price(&pool, mover.id, 115.0).await;
    for _ in 0..3 {
        SearchMetricRepo::record(&pool, mover.id, MetricKind::Search)
            .await
            .unwrap();
    }
    SearchMetricRepo::record(&pool, mover.id, MetricKind::Social)
        .await
        .unwrap();

    // Sleeper: a single point, so zero price-change component.
    push_price(&pool, sleeper.id, 5.0).await;

    let outcome = engine.recompute().await.unwrap();
    assert_eq!(outcome.cards_scored, 2);
    assert_eq!(outcome.failed, 0);

    let mover_score = TrendingRepo::find_by_card(&pool, mover.id)
        .await
        .unwrap()
        .unwrap();
    // 15% change against the 50% cap.
    assert!((mover_score.price_change_score - 0.3).abs() < 1e-9);
    assert!(mover_score.combined_score > 0.0);

    let sleeper_score = TrendingRepo::find_by_card(&pool, sleeper.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sleeper_score.price_change_score, 0.0);
    assert!(mover_score.combined_score > sleeper_score.combined_score);
}

#[sqlx::test(migrations = "../../migrations")]
async fn recompute_replaces_rather_than_accumulates(pool: PgPool) {
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    let cache = TieredCache::new(Arc::new(MemoryTier::new()));
    let engine = TrendingEngine::new(pool.clone(), cache);

    push_price(&pool, card.id, 100.0).await;
    push_price(&pool, card.id, 115.0).await;
    engine.recompute().await.unwrap();
    let first = TrendingRepo::find_by_card(&pool, card.id).await.unwrap().unwrap();

    // The move cools off: latest two points are now flat.
    push_price(&pool, card.id, 115.0).await;
    engine.recompute().await.unwrap();
    let second = TrendingRepo::find_by_card(&pool, card.id).await.unwrap().unwrap();

    assert!((first.price_change_score - 0.3).abs() < 1e-9);
    assert_eq!(second.price_change_score, 0.0);
    assert!(second.computed_at >= first.computed_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_trending_serves_the_cached_top_list(pool: PgPool) {
    let card = seed_card(&pool, "swsh7-215", "Rayquaza VMAX").await;
    let cache = TieredCache::new(Arc::new(MemoryTier::new()));
    let engine = TrendingEngine::new(pool.clone(), cache.clone());

    push_price(&pool, card.id, 100.0).await;
    push_price(&pool, card.id, 115.0).await;
    engine.recompute().await.unwrap();

    // The recompute left a denormalized top list in the fast tier.
    let cached: Option<Vec<TrendingCard>> = cache.get_json("trending:top").await;
    let cached = cached.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].card_id, card.id);

    let top = engine
        .get_trending(10, &TrendingFilter::default())
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "Rayquaza VMAX");
    assert_eq!(top[0].near_mint, None);

    // A filtered read bypasses the cache and still answers.
    let filtered = engine
        .get_trending(
            10,
            &TrendingFilter {
                set_id: card.set_id,
                rarity: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}
