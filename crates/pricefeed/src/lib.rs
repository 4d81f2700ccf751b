//! Client for the third-party card pricing API.
//!
//! The upstream is a metered JSON API: card lookups by external id, paged
//! set listings, and paged set-member listings. [`client::PriceFeedClient`]
//! wraps it with typed errors so callers can tell retryable conditions
//! (rate limits, timeouts) from terminal ones (bad credentials, unknown
//! ids). The [`PriceFeed`] trait is the seam the sync engine consumes, so
//! tests can substitute a scripted feed.

pub mod client;
pub mod payloads;

pub use client::{PriceFeedClient, PriceFeedError};
pub use payloads::{CardPricePayload, GradedPricePayload, PagedSets, RawPricePayload, SetPayload};

use async_trait::async_trait;

/// The upstream operations the sync engine depends on.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch one card's pricing payload by its upstream id.
    async fn get_card(
        &self,
        external_id: &str,
        include_ebay: bool,
    ) -> Result<CardPricePayload, PriceFeedError>;

    /// Fetch every card in a set, paging internally until the
    /// upstream-reported page count is exhausted.
    async fn get_cards_by_set(
        &self,
        external_set_id: &str,
    ) -> Result<Vec<CardPricePayload>, PriceFeedError>;

    /// Fetch the full set listing, newest first.
    async fn get_sets(&self) -> Result<Vec<SetPayload>, PriceFeedError>;
}
