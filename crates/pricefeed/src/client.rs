//! HTTP client for the pricing API.

use std::time::Duration;

use async_trait::async_trait;

use crate::payloads::{CardPricePayload, PagedCards, PagedSets, SetPayload};
use crate::PriceFeed;

/// Request timeout for every upstream call. Expiry surfaces as a
/// retryable [`PriceFeedError::Request`].
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Page size for paged listings.
const PAGE_SIZE: u32 = 250;

/// Errors from the pricing API layer.
///
/// `Clone` because the request coalescer broadcasts one rejection to every
/// waiter; network errors are carried as strings for that reason.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PriceFeedError {
    /// Credit budget exhausted or request rate exceeded. Retryable later.
    #[error("price feed rate limit hit")]
    RateLimited,

    /// Credentials missing on the upstream side or rejected. Terminal.
    #[error("price feed rejected credentials")]
    Unauthorized,

    /// The upstream does not know this id. Terminal for the entity.
    #[error("price feed has no entry for {0}")]
    NotFound(String),

    /// Network-level failure (DNS, TLS, connect, timeout). Retryable.
    #[error("price feed request failed: {0}")]
    Request(String),

    /// Unexpected upstream status or body shape.
    #[error("price feed error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// No API key configured. Terminal for the whole job, checked before
    /// any item is processed.
    #[error("price feed API key is not configured")]
    MissingCredentials,
}

impl PriceFeedError {
    /// Whether a later retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PriceFeedError::RateLimited | PriceFeedError::Request(_) => true,
            PriceFeedError::Api { status, .. } => *status >= 500,
            PriceFeedError::Unauthorized
            | PriceFeedError::NotFound(_)
            | PriceFeedError::MissingCredentials => false,
        }
    }
}

impl From<reqwest::Error> for PriceFeedError {
    fn from(e: reqwest::Error) -> Self {
        PriceFeedError::Request(e.to_string())
    }
}

/// Client for one pricing API account.
#[derive(Debug)]
pub struct PriceFeedClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PriceFeedClient {
    /// Create a client. Fails fast when the key is empty so scheduled
    /// jobs abort before processing any item.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, PriceFeedError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PriceFeedError::MissingCredentials);
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PriceFeedError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Base URL of the configured upstream.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        not_found_subject: &str,
    ) -> Result<T, PriceFeedError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            429 => return Err(PriceFeedError::RateLimited),
            401 | 403 => return Err(PriceFeedError::Unauthorized),
            404 => return Err(PriceFeedError::NotFound(not_found_subject.to_string())),
            code => {
                let body = response.text().await.unwrap_or_default();
                return Err(PriceFeedError::Api { status: code, body });
            }
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PriceFeedError::Api {
            status: status.as_u16(),
            body: format!("undecodable body: {e}"),
        })
    }
}

#[async_trait]
impl PriceFeed for PriceFeedClient {
    async fn get_card(
        &self,
        external_id: &str,
        include_ebay: bool,
    ) -> Result<CardPricePayload, PriceFeedError> {
        let mut query = vec![("include_graded", "true".to_string())];
        if include_ebay {
            query.push(("include_ebay", "true".to_string()));
        }
        self.get_json(&format!("/cards/{external_id}"), &query, external_id)
            .await
    }

    async fn get_cards_by_set(
        &self,
        external_set_id: &str,
    ) -> Result<Vec<CardPricePayload>, PriceFeedError> {
        let mut cards = Vec::new();
        let mut page = 1u32;
        loop {
            let paged: PagedCards = self
                .get_json(
                    &format!("/sets/{external_set_id}/cards"),
                    &[
                        ("page", page.to_string()),
                        ("page_size", PAGE_SIZE.to_string()),
                    ],
                    external_set_id,
                )
                .await?;
            cards.extend(paged.data);
            if paged.page >= paged.total_pages {
                break;
            }
            page = paged.page + 1;
        }
        tracing::debug!(
            set = external_set_id,
            cards = cards.len(),
            pages = page,
            "fetched set members"
        );
        Ok(cards)
    }

    async fn get_sets(&self) -> Result<Vec<SetPayload>, PriceFeedError> {
        let mut sets = Vec::new();
        let mut page = 1u32;
        loop {
            let paged: PagedSets = self
                .get_json(
                    "/sets",
                    &[
                        ("page", page.to_string()),
                        ("page_size", PAGE_SIZE.to_string()),
                    ],
                    "sets",
                )
                .await?;
            sets.extend(paged.data);
            if paged.page >= paged.total_pages {
                break;
            }
            page = paged.page + 1;
        }
        Ok(sets)
    }
}
