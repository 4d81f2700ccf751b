//! Tiered price cache and request coalescing.
//!
//! The fast tier is a shared external key-value store (Redis in
//! production, an in-memory map in tests) behind the [`tier::CacheTier`]
//! trait. [`tiered::TieredCache`] wraps a tier with JSON codec and the
//! degrade-to-miss failure policy. [`coalesce::Coalescer`] guarantees at
//! most one in-flight producer per key within a process; cross-process
//! deduplication is best-effort via the shared tier's writes.

pub mod coalesce;
pub mod tier;
pub mod tiered;

pub use coalesce::{CoalesceError, Coalescer};
pub use tier::{CacheTier, MemoryTier, RedisTier, TierError};
pub use tiered::TieredCache;
