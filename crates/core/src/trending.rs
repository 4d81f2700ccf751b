//! Trending score computation.
//!
//! Four signals, each clamped to [0, 1] against a fixed cap, combined as a
//! weighted sum. Caps and weights are design constants: no calibration data
//! exists to justify anything adaptive, so they are deliberately plain
//! numbers with a test pinning the weight-sum invariant.

// ---------------------------------------------------------------------------
// Caps
// ---------------------------------------------------------------------------

/// A 24h price move of this magnitude (percent) saturates the price signal.
pub const PRICE_CHANGE_CAP: f64 = 50.0;

/// Trade volume (history points in 24h) that saturates the volume signal.
pub const VOLUME_CAP: f64 = 100.0;

/// Search count in 24h that saturates the search signal.
pub const SEARCH_CAP: f64 = 1000.0;

/// Social mentions in 24h that saturate the social signal.
pub const SOCIAL_CAP: f64 = 50.0;

// ---------------------------------------------------------------------------
// Weights (must sum to 1.0)
// ---------------------------------------------------------------------------

/// Weight of the price-change component.
pub const WEIGHT_PRICE_CHANGE: f64 = 0.30;

/// Weight of the volume component.
pub const WEIGHT_VOLUME: f64 = 0.25;

/// Weight of the search component.
pub const WEIGHT_SEARCHES: f64 = 0.25;

/// Weight of the social component.
pub const WEIGHT_SOCIAL: f64 = 0.20;

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// The four normalized components of a trending score.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TrendingComponents {
    pub price_change: f64,
    pub volume: f64,
    pub searches: f64,
    pub social: f64,
}

/// Normalize a raw metric against its cap: `min(|raw| / cap, 1)`.
pub fn normalize_metric(raw: f64, cap: f64) -> f64 {
    (raw.abs() / cap).min(1.0)
}

/// Compute the normalized components for a card's raw signals.
pub fn components(
    price_change_percent: f64,
    volume: f64,
    search_count: f64,
    social_mentions: f64,
) -> TrendingComponents {
    TrendingComponents {
        price_change: normalize_metric(price_change_percent, PRICE_CHANGE_CAP),
        volume: normalize_metric(volume, VOLUME_CAP),
        searches: normalize_metric(search_count, SEARCH_CAP),
        social: normalize_metric(social_mentions, SOCIAL_CAP),
    }
}

/// Weighted combination of normalized components. Always in [0, 1].
pub fn combined_score(c: &TrendingComponents) -> f64 {
    WEIGHT_PRICE_CHANGE * c.price_change
        + WEIGHT_VOLUME * c.volume
        + WEIGHT_SEARCHES * c.searches
        + WEIGHT_SOCIAL * c.social
}

/// Convenience wrapper: raw signals in, combined score out.
pub fn calculate_trending_score(
    price_change_percent: f64,
    volume: f64,
    search_count: f64,
    social_mentions: f64,
) -> f64 {
    combined_score(&components(
        price_change_percent,
        volume,
        search_count,
        social_mentions,
    ))
}

// ---------------------------------------------------------------------------
// Price-change derivation
// ---------------------------------------------------------------------------

/// Percent change between the two most recent price points, newest first.
///
/// Cards with fewer than two points, or a non-positive older price, get a
/// zero change component instead of a division blowup.
pub fn change_percent_from_points(points: &[f64]) -> f64 {
    match points {
        [newest, previous, ..] if *previous > 0.0 => (newest - previous) / previous * 100.0,
        _ => 0.0,
    }
}
