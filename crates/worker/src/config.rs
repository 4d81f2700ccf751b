//! Worker configuration from the environment.
//!
//! Missing credentials are a startup failure: a scheduled job must abort
//! before processing any item rather than fail N times identically.

use std::time::Duration;

/// Default pricing API endpoint.
const DEFAULT_FEED_URL: &str = "https://api.cardpricer.io/v2";

/// Default interval for the stale-price sync job: 6 hours.
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Default interval for the trending recompute: 1 hour.
const DEFAULT_TRENDING_INTERVAL_SECS: u64 = 60 * 60;

/// Default interval for the alert sweep: 15 minutes.
const DEFAULT_ALERTS_INTERVAL_SECS: u64 = 15 * 60;

/// Default batch size for one stale-sync invocation.
const DEFAULT_SYNC_BATCH_SIZE: i64 = 50;

/// Runtime configuration for the worker process.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Optional: without Redis the worker runs on an in-process tier.
    pub redis_url: Option<String>,
    pub feed_url: String,
    pub feed_api_key: String,
    pub sync_interval: Duration,
    pub trending_interval: Duration,
    pub alerts_interval: Duration,
    pub sync_batch_size: i64,
}

impl Config {
    /// Load from the environment, failing fast on anything required.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
        let feed_api_key = std::env::var("PRICE_FEED_API_KEY")
            .map_err(|_| anyhow::anyhow!("PRICE_FEED_API_KEY is not set"))?;

        Ok(Self {
            database_url,
            redis_url: std::env::var("REDIS_URL").ok(),
            feed_url: std::env::var("PRICE_FEED_URL")
                .unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            feed_api_key,
            sync_interval: env_secs("SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS),
            trending_interval: env_secs("TRENDING_INTERVAL_SECS", DEFAULT_TRENDING_INTERVAL_SECS),
            alerts_interval: env_secs("ALERTS_INTERVAL_SECS", DEFAULT_ALERTS_INTERVAL_SECS),
            sync_batch_size: std::env::var("SYNC_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SYNC_BATCH_SIZE),
        })
    }
}

fn env_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}
