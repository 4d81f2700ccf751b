//! Price synchronization and derived-signal engines.
//!
//! [`engine::PriceSyncEngine`] owns the cache-aside read path (coalesced
//! fetch, stale fallback), the batched stale-card sync, and set imports.
//! [`trending::TrendingEngine`] recomputes trending scores wholesale from
//! price history and interest metrics. [`alerts::AlertEngine`] evaluates
//! standing alerts edge-triggered against a moving baseline. All three are
//! idempotent entry points: the scheduler may re-run any of them after a
//! crash without special-casing who called.

pub mod alerts;
pub mod engine;
pub mod error;
pub mod transform;
pub mod trending;

pub use alerts::{AlertCheckOutcome, AlertEngine};
pub use engine::{ImportOutcome, PriceOptions, PriceSyncEngine, PricedCard, SyncOutcome};
pub use error::SyncError;
pub use trending::{RecomputeOutcome, TrendingEngine};

/// Error lists returned by batch operations are capped at this many
/// messages; the counts still reflect every failure.
pub const MAX_REPORTED_ERRORS: usize = 10;
