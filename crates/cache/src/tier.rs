//! Fast-tier storage backends.
//!
//! A tier is a plain key-value store with per-entry TTL expressed at write
//! time. Values are opaque serialized strings; the tier makes no
//! assumption about their structure beyond key uniqueness.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;

/// Errors from a fast-tier backend. Callers treat any of these as a miss.
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    /// The backing store was unreachable or rejected the command.
    #[error("cache tier unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for TierError {
    fn from(e: redis::RedisError) -> Self {
        TierError::Unavailable(e.to_string())
    }
}

/// Key-value storage with write-time TTL.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Read a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, TierError>;

    /// Store a value, overwriting wholesale, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), TierError>;

    /// Drop a key. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), TierError>;
}

// ---------------------------------------------------------------------------
// RedisTier
// ---------------------------------------------------------------------------

/// Shared fast tier backed by Redis. One connection manager per process;
/// it reconnects internally, so a Redis restart degrades reads to misses
/// instead of wedging the worker.
pub struct RedisTier {
    conn: redis::aio::ConnectionManager,
}

impl RedisTier {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, TierError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheTier for RedisTier {
    async fn get(&self, key: &str) -> Result<Option<String>, TierError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), TierError> {
        let mut conn = self.conn.clone();
        // SET with EX; sub-second TTLs round up to one second.
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), TierError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryTier
// ---------------------------------------------------------------------------

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process tier for tests and Redis-less development. Expired entries
/// are purged lazily on read.
#[derive(Default)]
pub struct MemoryTier {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    async fn get(&self, key: &str) -> Result<Option<String>, TierError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Entry existed but expired: purge under the write lock.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= Instant::now()) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), TierError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), TierError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_tier_round_trip() {
        let tier = MemoryTier::new();
        tier.set("k", "v".into(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(tier.get("k").await.unwrap(), Some("v".to_string()));
        tier.delete("k").await.unwrap();
        assert_eq!(tier.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_tier_expires_entries() {
        let tier = MemoryTier::new();
        tier.set("k", "v".into(), Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(tier.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_tier_overwrites_wholesale() {
        let tier = MemoryTier::new();
        tier.set("k", "old".into(), Duration::from_secs(60)).await.unwrap();
        tier.set("k", "new".into(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(tier.get("k").await.unwrap(), Some("new".to_string()));
    }
}
