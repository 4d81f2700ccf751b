//! Wire payloads from the pricing API.
//!
//! Numeric price fields are deliberately kept as raw JSON values: the feed
//! mixes numbers, numeric strings, and nulls, and the sync transform owns
//! the finite-or-null coercion. Everything else deserializes leniently
//! with defaults so one malformed optional field does not sink a payload.

use std::collections::HashMap;

use serde::Deserialize;

/// One card's pricing payload from `GET /cards/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CardPricePayload {
    /// Upstream card identifier.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub set_id: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Raw-condition prices; absent for graded-only listings.
    #[serde(default)]
    pub prices: Option<RawPricePayload>,
    /// Graded aggregates keyed by the feed's (unnormalized) grade names.
    #[serde(default)]
    pub graded_prices: Option<HashMap<String, GradedPricePayload>>,
}

/// Raw-condition price block. Values are raw JSON (number, string, null).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPricePayload {
    #[serde(default)]
    pub near_mint: Option<serde_json::Value>,
    #[serde(default)]
    pub lightly_played: Option<serde_json::Value>,
    #[serde(default)]
    pub moderately_played: Option<serde_json::Value>,
    #[serde(default)]
    pub heavily_played: Option<serde_json::Value>,
}

/// Graded sale aggregates for one grade bucket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradedPricePayload {
    #[serde(default)]
    pub average: Option<serde_json::Value>,
    #[serde(default)]
    pub median: Option<serde_json::Value>,
    #[serde(default)]
    pub low: Option<serde_json::Value>,
    #[serde(default)]
    pub high: Option<serde_json::Value>,
    #[serde(default)]
    pub sample_count: Option<i64>,
}

/// One set from the paged listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_cards: Option<i32>,
}

/// Paged envelope for the set listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedSets {
    pub data: Vec<SetPayload>,
    pub page: u32,
    pub total_pages: u32,
}

/// Paged envelope for set-member card listings.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedCards {
    pub data: Vec<CardPricePayload>,
    pub page: u32,
    pub total_pages: u32,
}
