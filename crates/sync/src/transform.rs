//! Upstream payload normalization.
//!
//! Everything crossing from the feed into the price model goes through
//! here: grade keys are normalized so cosmetic upstream naming never
//! creates duplicate buckets, and numeric fields become finite numbers or
//! null, never NaN and never negative.

use cardvault_core::grading::{normalize_grade_key, RAW_GRADE_KEY};
use cardvault_core::pricing::{
    finite_price, ttl_for_value, GradedPrice, GradedPrices, RawPrices,
};
use cardvault_core::types::{DbId, Timestamp};
use cardvault_db::models::price_history::NewPricePoint;
use cardvault_db::models::price_snapshot::NewPriceSnapshot;
use cardvault_pricefeed::{CardPricePayload, GradedPricePayload};

/// Build the wholesale snapshot replacement for one card from an upstream
/// payload. Returns `None` when the payload yields no raw and no graded
/// prices — such snapshots are never persisted; absence of a row is the
/// representation of "no known prices".
///
/// The snapshot's expiry is `fetched_at` plus the value-tiered TTL derived
/// from the near-mint raw price.
pub fn snapshot_from_payload(
    card_id: DbId,
    payload: &CardPricePayload,
    fetched_at: Timestamp,
) -> Option<NewPriceSnapshot> {
    let raw = payload
        .prices
        .as_ref()
        .map(|p| RawPrices {
            near_mint: finite_price(p.near_mint.as_ref()),
            lightly_played: finite_price(p.lightly_played.as_ref()),
            moderately_played: finite_price(p.moderately_played.as_ref()),
            heavily_played: finite_price(p.heavily_played.as_ref()),
        })
        .unwrap_or_default();

    let graded = payload
        .graded_prices
        .as_ref()
        .map(|buckets| graded_from_payload(buckets))
        .unwrap_or_default();

    let snapshot = NewPriceSnapshot {
        card_id,
        expires_at: fetched_at
            + chrono::Duration::from_std(ttl_for_value(raw.near_mint))
                .unwrap_or_else(|_| chrono::Duration::hours(4)),
        raw,
        graded,
        fetched_at,
    };
    (!snapshot.is_empty()).then_some(snapshot)
}

/// Normalize graded buckets. When two upstream names collapse to the same
/// key (e.g. `"PSA 10"` and `"psa-10"`), the bucket with more samples
/// wins. Buckets with no usable numbers at all are dropped.
fn graded_from_payload(
    buckets: &std::collections::HashMap<String, GradedPricePayload>,
) -> GradedPrices {
    let mut graded = GradedPrices::new();
    for (name, bucket) in buckets {
        let key = normalize_grade_key(name);
        if key.is_empty() {
            continue;
        }
        let price = GradedPrice {
            average: finite_price(bucket.average.as_ref()),
            median: finite_price(bucket.median.as_ref()),
            low: finite_price(bucket.low.as_ref()),
            high: finite_price(bucket.high.as_ref()),
            sample_count: bucket.sample_count.unwrap_or(0).max(0),
        };
        if price.average.is_none()
            && price.median.is_none()
            && price.low.is_none()
            && price.high.is_none()
        {
            continue;
        }
        match graded.get(&key) {
            Some(existing) if existing.sample_count >= price.sample_count => {}
            _ => {
                graded.insert(key, price);
            }
        }
    }
    graded
}

/// History points to append for a stored snapshot: the raw near-mint
/// series plus one point per graded average.
pub fn history_points(snapshot: &NewPriceSnapshot) -> Vec<NewPricePoint> {
    let mut points = Vec::new();
    if let Some(near_mint) = snapshot.raw.near_mint {
        points.push(NewPricePoint {
            card_id: snapshot.card_id,
            grade_key: RAW_GRADE_KEY.to_string(),
            price: near_mint,
        });
    }
    for (key, bucket) in &snapshot.graded {
        if let Some(average) = bucket.average {
            points.push(NewPricePoint {
                card_id: snapshot.card_id,
                grade_key: key.clone(),
                price: average,
            });
        }
    }
    points
}
