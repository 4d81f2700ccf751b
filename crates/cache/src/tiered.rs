//! JSON-codec cache facade with the degrade-to-miss policy.
//!
//! A tier outage must never fail a price read: reads collapse to a miss
//! and writes to a no-op, each with a warning, and the caller proceeds to
//! its next fallback (row store, then stale-accept).

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::tier::CacheTier;

/// Shared fast-tier cache with JSON values.
#[derive(Clone)]
pub struct TieredCache {
    tier: Arc<dyn CacheTier>,
}

impl TieredCache {
    pub fn new(tier: Arc<dyn CacheTier>) -> Self {
        Self { tier }
    }

    /// Read and decode a value. Tier outages and undecodable entries both
    /// read as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.tier.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "cache entry undecodable; treating as miss");
                None
            }
        }
    }

    /// Encode and store a value with a TTL. Best-effort: failures are
    /// logged and swallowed.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache value unserializable; skipping write");
                return;
            }
        };
        if let Err(e) = self.tier.set(key, raw, ttl).await {
            tracing::warn!(key, error = %e, "cache write failed; continuing without cache");
        }
    }

    /// Best-effort delete.
    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.tier.delete(key).await {
            tracing::warn!(key, error = %e, "cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::{MemoryTier, TierError};
    use async_trait::async_trait;

    /// A tier that fails every command, standing in for an unreachable
    /// Redis.
    struct DownTier;

    #[async_trait]
    impl CacheTier for DownTier {
        async fn get(&self, _key: &str) -> Result<Option<String>, TierError> {
            Err(TierError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), TierError> {
            Err(TierError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), TierError> {
            Err(TierError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn json_round_trip() {
        let cache = TieredCache::new(Arc::new(MemoryTier::new()));
        cache.set_json("k", &vec![1, 2, 3], Duration::from_secs(60)).await;
        assert_eq!(cache.get_json::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn tier_outage_reads_as_miss_and_writes_as_noop() {
        let cache = TieredCache::new(Arc::new(DownTier));
        cache.set_json("k", &1, Duration::from_secs(60)).await;
        assert_eq!(cache.get_json::<i32>("k").await, None);
    }

    #[tokio::test]
    async fn undecodable_entry_reads_as_miss() {
        let tier = Arc::new(MemoryTier::new());
        tier.set("k", "not json".into(), Duration::from_secs(60)).await.unwrap();
        let cache = TieredCache::new(tier);
        assert_eq!(cache.get_json::<Vec<i32>>("k").await, None);
    }
}
