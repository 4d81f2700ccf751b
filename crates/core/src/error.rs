//! Error type shared by the pure domain modules.

/// Errors produced by domain-level validation and computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A grade key could not be interpreted (empty after normalization).
    #[error("invalid grade key: {0:?}")]
    InvalidGradeKey(String),

    /// An alert threshold outside the accepted percent range.
    #[error("threshold percent out of range: {0}")]
    InvalidThreshold(f64),

    /// A metric value that must be non-negative was negative.
    #[error("negative metric value: {name} = {value}")]
    NegativeMetric {
        /// Which metric was rejected.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
}
