//! Price value types and the value-tiered refresh policy.
//!
//! High-value cards move fast and users watch them closely; cheap bulk does
//! not justify the metered fetch cost. The TTL policy below encodes that:
//! the more a card's near-mint raw copy is worth, the shorter its snapshot
//! lives before the sync engine considers it stale.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TTL policy
// ---------------------------------------------------------------------------

/// Near-mint price at or above which a card gets the short TTL.
pub const HIGH_VALUE_THRESHOLD: f64 = 1000.0;

/// Near-mint price at or above which a card gets the medium TTL.
pub const MID_VALUE_THRESHOLD: f64 = 100.0;

/// Snapshot TTL for high-value cards.
pub const TTL_SHORT: Duration = Duration::from_secs(60 * 60);

/// Snapshot TTL for mid-value cards. Also the fast-tier default.
pub const TTL_MEDIUM: Duration = Duration::from_secs(2 * 60 * 60);

/// Snapshot TTL for everything else.
pub const TTL_LONG: Duration = Duration::from_secs(4 * 60 * 60);

/// Select the snapshot TTL for a card from its near-mint raw price.
///
/// A card with no known near-mint price falls into the long tier.
pub fn ttl_for_value(near_mint: Option<f64>) -> Duration {
    match near_mint {
        Some(price) if price >= HIGH_VALUE_THRESHOLD => TTL_SHORT,
        Some(price) if price >= MID_VALUE_THRESHOLD => TTL_MEDIUM,
        _ => TTL_LONG,
    }
}

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Per-condition prices for a raw (ungraded) card. All fields nullable:
/// the upstream feed frequently has no data for the played conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPrices {
    pub near_mint: Option<f64>,
    pub lightly_played: Option<f64>,
    pub moderately_played: Option<f64>,
    pub heavily_played: Option<f64>,
}

impl RawPrices {
    /// True when no condition has a price at all.
    pub fn is_empty(&self) -> bool {
        self.near_mint.is_none()
            && self.lightly_played.is_none()
            && self.moderately_played.is_none()
            && self.heavily_played.is_none()
    }
}

/// Aggregate sale statistics for one graded bucket (e.g. `psa10`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedPrice {
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
    /// Number of sales behind the aggregate.
    pub sample_count: i64,
}

/// Graded prices keyed by normalized grade key. `BTreeMap` so serialized
/// snapshots are byte-stable across runs.
pub type GradedPrices = BTreeMap<String, GradedPrice>;

// ---------------------------------------------------------------------------
// Numeric hygiene
// ---------------------------------------------------------------------------

/// Coerce an upstream JSON field to a finite price.
///
/// Upstream payloads mix numbers, numeric strings, and junk. Anything that
/// is not a finite non-negative number becomes `None` rather than a NaN or
/// a negative price leaking into the snapshot.
pub fn finite_price(value: Option<&serde_json::Value>) -> Option<f64> {
    let n = match value? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}
