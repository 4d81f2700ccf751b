//! Request coalescing: at most one upstream fetch in flight per key.
//!
//! Every upstream fetch costs metered credits, so N concurrent readers of
//! the same key must share one producer run. The leader executes the
//! producer, writes the success value through the cache, clears the
//! in-flight marker, and broadcasts the outcome; followers subscribe and
//! settle with the identical value or the identical rejection. Failures
//! are never cached — the next call after settlement starts a fresh
//! producer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::tiered::TieredCache;

/// Outcome error for a coalesced fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoalesceError<E> {
    /// The single producer run failed; every waiter sees this same error.
    #[error("{0}")]
    Producer(E),

    /// The leader was cancelled before settling. Waiters cannot know the
    /// outcome; the next call starts a fresh producer.
    #[error("in-flight fetch abandoned before settling")]
    Abandoned,
}

type Flight<T, E> = (u64, broadcast::Sender<Result<T, CoalesceError<E>>>);
type FlightMap<T, E> = Arc<Mutex<HashMap<String, Flight<T, E>>>>;

/// Per-process request coalescer writing through a [`TieredCache`].
///
/// Cross-process deduplication is best-effort via the shared fast tier:
/// another instance's fetch populates the cache this instance reads. The
/// hard at-most-one guarantee holds within one process only.
pub struct Coalescer<T, E> {
    cache: TieredCache,
    inflight: FlightMap<T, E>,
    next_flight: AtomicU64,
}

impl<T, E> Coalescer<T, E>
where
    T: Clone + Serialize + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new(cache: TieredCache) -> Self {
        Self {
            cache,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_flight: AtomicU64::new(0),
        }
    }

    /// Run `producer` for `key` unless a run is already in flight, in
    /// which case wait for that run's outcome. On success the value is
    /// stored in the cache under `key` with `ttl` before the marker is
    /// cleared. No retry happens here; stale-fallback is the caller's
    /// concern.
    pub async fn coalesce<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, CoalesceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        enum Role<T, E> {
            Leader(u64),
            Follower(broadcast::Receiver<Result<T, CoalesceError<E>>>),
        }

        let role = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some((_, tx)) => Role::Follower(tx.subscribe()),
                None => {
                    let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                    let (tx, _) = broadcast::channel(1);
                    inflight.insert(key.to_string(), (id, tx));
                    Role::Leader(id)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => match rx.recv().await {
                Ok(outcome) => outcome,
                // Sender dropped without settling: leader was cancelled.
                Err(_) => Err(CoalesceError::Abandoned),
            },
            Role::Leader(id) => {
                // If this future is dropped mid-producer, the guard clears
                // the marker so followers are not wedged on a dead flight.
                let guard = FlightGuard {
                    inflight: Arc::clone(&self.inflight),
                    key: key.to_string(),
                    id,
                    armed: true,
                };

                let result = producer().await;

                if let Ok(value) = &result {
                    // Cache before clearing the marker: a reader that
                    // misses the flight must already see the value.
                    self.cache.set_json(key, value, ttl).await;
                }

                let tx = {
                    let mut inflight = guard.inflight.lock().await;
                    match inflight.get(&guard.key) {
                        Some((flight_id, _)) if *flight_id == id => {
                            inflight.remove(&guard.key).map(|(_, tx)| tx)
                        }
                        _ => None,
                    }
                };
                guard.disarm();

                let outcome = result.map_err(CoalesceError::Producer);
                if let Some(tx) = tx {
                    // No receivers is fine: the leader may be alone.
                    let _ = tx.send(outcome.clone());
                }
                outcome
            }
        }
    }

    /// Number of flights currently in the air (test/metrics hook).
    pub async fn inflight_count(&self) -> usize {
        self.inflight.lock().await.len()
    }
}

/// Removes an abandoned flight's marker when the leader future is dropped
/// before settling. Identity-checked so a newer flight under the same key
/// is never torn down.
struct FlightGuard<T: Send + 'static, E: Send + 'static> {
    inflight: FlightMap<T, E>,
    key: String,
    id: u64,
    armed: bool,
}

impl<T: Send + 'static, E: Send + 'static> FlightGuard<T, E> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T: Send + 'static, E: Send + 'static> Drop for FlightGuard<T, E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let inflight = Arc::clone(&self.inflight);
        let key = std::mem::take(&mut self.key);
        let id = self.id;
        tokio::spawn(async move {
            let mut inflight = inflight.lock().await;
            if inflight.get(&key).is_some_and(|(flight_id, _)| *flight_id == id) {
                inflight.remove(&key);
            }
        });
    }
}
