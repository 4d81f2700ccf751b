//! Price-alert trigger rules.
//!
//! Alerts are edge-triggered against a moving baseline: a trigger resets
//! the baseline to the price that fired it, so the same absolute move never
//! fires twice. The engine owns the bookkeeping; the rule itself lives here.

use crate::error::CoreError;

/// Accepted threshold range for user alerts, in percent.
pub const MIN_THRESHOLD_PERCENT: f64 = 1.0;
pub const MAX_THRESHOLD_PERCENT: f64 = 500.0;

// ---------------------------------------------------------------------------
// AlertDirection
// ---------------------------------------------------------------------------

/// Which direction of price movement an alert watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Up,
    Down,
    Both,
}

impl AlertDirection {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Up => "up",
            AlertDirection::Down => "down",
            AlertDirection::Both => "both",
        }
    }

    /// Parse from a stored string, defaulting to `Both` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "up" => AlertDirection::Up,
            "down" => AlertDirection::Down,
            _ => AlertDirection::Both,
        }
    }

    /// Whether a signed percent change moves in this direction.
    pub fn matches(&self, change_percent: f64) -> bool {
        match self {
            AlertDirection::Up => change_percent > 0.0,
            AlertDirection::Down => change_percent < 0.0,
            AlertDirection::Both => change_percent != 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger rule
// ---------------------------------------------------------------------------

/// Signed percent change from `baseline` to `current`.
///
/// A non-positive baseline yields zero: a baseline of 0 has no meaningful
/// percent change and must not fire an alert.
pub fn percent_change(baseline: f64, current: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    (current - baseline) / baseline * 100.0
}

/// The edge-trigger rule: fire iff the move is at least `threshold_percent`
/// in magnitude and its sign matches the configured direction.
pub fn should_trigger(change_percent: f64, threshold_percent: f64, direction: AlertDirection) -> bool {
    change_percent.abs() >= threshold_percent && direction.matches(change_percent)
}

/// Validate a user-supplied threshold percent.
pub fn validate_threshold(threshold_percent: f64) -> Result<(), CoreError> {
    if !threshold_percent.is_finite()
        || !(MIN_THRESHOLD_PERCENT..=MAX_THRESHOLD_PERCENT).contains(&threshold_percent)
    {
        return Err(CoreError::InvalidThreshold(threshold_percent));
    }
    Ok(())
}
