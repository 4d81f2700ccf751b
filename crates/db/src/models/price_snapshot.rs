//! Price snapshot model: the best-known pricing for one card.
//!
//! A snapshot is always replaced wholesale by the sync engine; nothing
//! mutates individual fields. A card with no known prices has no snapshot
//! row at all — empty snapshots are never persisted.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cardvault_core::grading::{GradingCompany, RAW_GRADE_KEY};
use cardvault_core::pricing::{GradedPrices, RawPrices};
use cardvault_core::types::{DbId, Timestamp};

/// A row from the `price_snapshots` table.
///
/// Serializable both ways: the fast cache tier stores the snapshot as JSON
/// and reads it back.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub id: DbId,
    pub card_id: DbId,
    pub near_mint: Option<f64>,
    pub lightly_played: Option<f64>,
    pub moderately_played: Option<f64>,
    pub heavily_played: Option<f64>,
    /// Graded aggregates keyed by normalized grade key.
    pub graded: serde_json::Value,
    pub fetched_at: Timestamp,
    /// `fetched_at` plus the value-tiered TTL.
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PriceSnapshot {
    /// The raw-condition price map.
    pub fn raw_prices(&self) -> RawPrices {
        RawPrices {
            near_mint: self.near_mint,
            lightly_played: self.lightly_played,
            moderately_played: self.moderately_played,
            heavily_played: self.heavily_played,
        }
    }

    /// Decode the graded map; malformed stored JSON reads as empty.
    pub fn graded_prices(&self) -> GradedPrices {
        serde_json::from_value(self.graded.clone()).unwrap_or_default()
    }

    /// Whether the snapshot has outlived its value-tiered TTL.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Hours since this snapshot was fetched.
    pub fn age_hours(&self, now: Timestamp) -> f64 {
        (now - self.fetched_at).num_seconds() as f64 / 3600.0
    }

    /// Resolve the price an alert or collection lookup cares about:
    /// near-mint for raw, otherwise the matching graded average.
    pub fn price_for(&self, company: GradingCompany, grade_key: &str) -> Option<f64> {
        if company == GradingCompany::Raw || grade_key == RAW_GRADE_KEY {
            return self.near_mint;
        }
        self.graded_prices().get(grade_key).and_then(|g| g.average)
    }

    /// Best currently-known price: near-mint raw, falling back to the
    /// highest graded average. Used to seed alert baselines.
    pub fn best_known_price(&self) -> Option<f64> {
        self.near_mint.or_else(|| {
            self.graded_prices()
                .values()
                .filter_map(|g| g.average)
                .fold(None, |best, avg| Some(best.map_or(avg, |b: f64| b.max(avg))))
        })
    }
}

/// Wholesale replacement payload produced by the sync transform.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceSnapshot {
    pub card_id: DbId,
    pub raw: RawPrices,
    pub graded: GradedPrices,
    pub fetched_at: Timestamp,
    pub expires_at: Timestamp,
}

impl NewPriceSnapshot {
    /// A payload with no raw and no graded entries must not be persisted.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.graded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardvault_core::pricing::GradedPrice;

    fn snapshot(near_mint: Option<f64>, graded: serde_json::Value) -> PriceSnapshot {
        let now = Utc::now();
        PriceSnapshot {
            id: 1,
            card_id: 1,
            near_mint,
            lightly_played: None,
            moderately_played: None,
            heavily_played: None,
            graded,
            fetched_at: now,
            expires_at: now + chrono::Duration::hours(2),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn price_for_raw_reads_near_mint() {
        let snap = snapshot(Some(12.0), serde_json::json!({}));
        assert_eq!(snap.price_for(GradingCompany::Raw, "raw"), Some(12.0));
    }

    #[test]
    fn price_for_grade_reads_graded_average() {
        let graded = serde_json::json!({
            "psa10": { "average": 250.0, "median": 240.0, "low": 200.0, "high": 310.0, "sample_count": 14 }
        });
        let snap = snapshot(Some(12.0), graded);
        assert_eq!(snap.price_for(GradingCompany::Psa, "psa10"), Some(250.0));
        assert_eq!(snap.price_for(GradingCompany::Psa, "psa9"), None);
    }

    #[test]
    fn best_known_price_prefers_near_mint() {
        let graded = serde_json::json!({
            "psa10": { "average": 250.0, "median": null, "low": null, "high": null, "sample_count": 3 }
        });
        assert_eq!(snapshot(Some(12.0), graded.clone()).best_known_price(), Some(12.0));
        assert_eq!(snapshot(None, graded).best_known_price(), Some(250.0));
    }

    #[test]
    fn malformed_graded_json_reads_empty() {
        let snap = snapshot(None, serde_json::json!([1, 2, 3]));
        assert!(snap.graded_prices().is_empty());
    }

    #[test]
    fn empty_payload_is_detected() {
        let now = Utc::now();
        let empty = NewPriceSnapshot {
            card_id: 1,
            raw: RawPrices::default(),
            graded: GradedPrices::new(),
            fetched_at: now,
            expires_at: now,
        };
        assert!(empty.is_empty());

        let mut graded = GradedPrices::new();
        graded.insert(
            "psa10".into(),
            GradedPrice {
                average: Some(10.0),
                median: None,
                low: None,
                high: None,
                sample_count: 1,
            },
        );
        let nonempty = NewPriceSnapshot {
            graded,
            ..empty
        };
        assert!(!nonempty.is_empty());
    }
}
