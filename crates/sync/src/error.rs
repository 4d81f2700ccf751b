//! Engine-level error taxonomy.

use cardvault_core::types::DbId;
use cardvault_pricefeed::PriceFeedError;

/// Errors from the sync, trending, and alert engines.
///
/// `Clone` because read-path errors cross the coalescer's broadcast
/// channel; database errors are carried as strings for that reason.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Upstream feed failure. Retryability follows the feed's own
    /// classification.
    #[error(transparent)]
    Feed(#[from] PriceFeedError),

    /// Row store failure. Treated as degraded mode by read paths.
    #[error("database error: {0}")]
    Db(String),

    /// Fatal misconfiguration; scheduled jobs abort early on this instead
    /// of failing every item identically.
    #[error("configuration error: {0}")]
    Config(String),

    /// A user-supplied parameter failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No card row with this id.
    #[error("unknown card: {0}")]
    UnknownCard(DbId),

    /// No alert row with this id.
    #[error("unknown alert: {0}")]
    UnknownAlert(DbId),

    /// Upstream answered but the payload carried no prices at all. The
    /// prior snapshot (if any) is left untouched.
    #[error("no price data for card {0}")]
    NoPriceData(DbId),

    /// A coalesced fetch was abandoned before settling.
    #[error("price fetch interrupted")]
    Interrupted,
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Db(e.to_string())
    }
}

impl SyncError {
    /// Whether a later retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Feed(e) => e.is_retryable(),
            SyncError::Db(_) | SyncError::Interrupted => true,
            SyncError::Config(_)
            | SyncError::InvalidInput(_)
            | SyncError::UnknownCard(_)
            | SyncError::UnknownAlert(_)
            | SyncError::NoPriceData(_) => false,
        }
    }
}
