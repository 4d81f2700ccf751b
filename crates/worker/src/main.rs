mod config;
mod jobs;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardvault_cache::{CacheTier, MemoryTier, RedisTier, TieredCache};
use cardvault_pricefeed::PriceFeedClient;
use cardvault_sync::{AlertEngine, PriceSyncEngine, TrendingEngine};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardvault_worker=debug,cardvault_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    cardvault_db::health_check(&pool).await?;

    let tier: Arc<dyn CacheTier> = match &config.redis_url {
        Some(url) => match RedisTier::connect(url).await {
            Ok(tier) => {
                tracing::info!("fast tier: redis");
                Arc::new(tier)
            }
            Err(e) => {
                tracing::warn!(error = %e, "redis unavailable; using in-process tier");
                Arc::new(MemoryTier::new())
            }
        },
        None => {
            tracing::info!("fast tier: in-process (REDIS_URL not set)");
            Arc::new(MemoryTier::new())
        }
    };
    let cache = TieredCache::new(tier);

    let feed = Arc::new(PriceFeedClient::new(&config.feed_url, &config.feed_api_key)?);
    let sync_engine = Arc::new(PriceSyncEngine::new(pool.clone(), cache.clone(), feed));
    let trending_engine = Arc::new(TrendingEngine::new(pool.clone(), cache.clone()));
    let alert_engine = Arc::new(AlertEngine::new(pool.clone()));

    let cancel = CancellationToken::new();
    let handles = vec![
        tokio::spawn(jobs::price_sync(
            Arc::clone(&sync_engine),
            config.sync_batch_size,
            config.sync_interval,
            cancel.clone(),
        )),
        tokio::spawn(jobs::trending(
            Arc::clone(&trending_engine),
            config.trending_interval,
            cancel.clone(),
        )),
        tokio::spawn(jobs::alerts(
            Arc::clone(&alert_engine),
            config.alerts_interval,
            cancel.clone(),
        )),
    ];

    tracing::info!("worker running; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
