//! Shared test fixtures: a scripted price feed and catalog seeding.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use cardvault_db::models::card::{Card, UpsertCard};
use cardvault_db::models::set::UpsertSet;
use cardvault_db::repositories::{CardRepo, SetRepo};
use cardvault_pricefeed::{
    CardPricePayload, PriceFeed, PriceFeedError, RawPricePayload, SetPayload,
};

/// In-memory stand-in for the pricing API. Cards and failure modes are
/// scripted per external id; every `get_card` call is counted.
#[derive(Default)]
pub struct ScriptedFeed {
    cards: Mutex<HashMap<String, CardPricePayload>>,
    failing: Mutex<HashSet<String>>,
    fail_all_with: Mutex<Option<PriceFeedError>>,
    sets: Mutex<Vec<SetPayload>>,
    set_cards: Mutex<HashMap<String, Vec<CardPricePayload>>>,
    pub card_calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_card(&self, payload: CardPricePayload) {
        self.cards.lock().unwrap().insert(payload.id.clone(), payload);
    }

    /// Make `get_card` fail for one external id with a retryable error.
    pub fn fail_card(&self, external_id: &str) {
        self.failing.lock().unwrap().insert(external_id.to_string());
    }

    /// Make every `get_card` call fail with `error`.
    pub fn fail_all(&self, error: PriceFeedError) {
        *self.fail_all_with.lock().unwrap() = Some(error);
    }

    pub fn put_set(&self, set: SetPayload, cards: Vec<CardPricePayload>) {
        self.set_cards.lock().unwrap().insert(set.id.clone(), cards);
        self.sets.lock().unwrap().push(set);
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    async fn get_card(
        &self,
        external_id: &str,
        _include_ebay: bool,
    ) -> Result<CardPricePayload, PriceFeedError> {
        self.card_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_all_with.lock().unwrap().clone() {
            return Err(error);
        }
        if self.failing.lock().unwrap().contains(external_id) {
            return Err(PriceFeedError::Request("scripted outage".to_string()));
        }
        self.cards
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or_else(|| PriceFeedError::NotFound(external_id.to_string()))
    }

    async fn get_cards_by_set(
        &self,
        external_set_id: &str,
    ) -> Result<Vec<CardPricePayload>, PriceFeedError> {
        self.set_cards
            .lock()
            .unwrap()
            .get(external_set_id)
            .cloned()
            .ok_or_else(|| PriceFeedError::NotFound(external_set_id.to_string()))
    }

    async fn get_sets(&self) -> Result<Vec<SetPayload>, PriceFeedError> {
        Ok(self.sets.lock().unwrap().clone())
    }
}

/// A card payload with only a near-mint raw price.
pub fn raw_payload(external_id: &str, name: &str, near_mint: f64) -> CardPricePayload {
    CardPricePayload {
        id: external_id.to_string(),
        name: name.to_string(),
        set_id: None,
        number: None,
        rarity: None,
        variant: None,
        image_url: None,
        prices: Some(RawPricePayload {
            near_mint: Some(serde_json::json!(near_mint)),
            lightly_played: None,
            moderately_played: None,
            heavily_played: None,
        }),
        graded_prices: None,
    }
}

/// A card payload that parses but carries no prices at all.
pub fn priceless_payload(external_id: &str, name: &str) -> CardPricePayload {
    CardPricePayload {
        id: external_id.to_string(),
        name: name.to_string(),
        set_id: None,
        number: None,
        rarity: None,
        variant: None,
        image_url: None,
        prices: None,
        graded_prices: None,
    }
}

pub fn set_payload(id: &str, name: &str) -> SetPayload {
    SetPayload {
        id: id.to_string(),
        name: name.to_string(),
        series: None,
        release_date: Some("2021-08-27".to_string()),
        total_cards: None,
    }
}

/// Seed one set and one card, returning the card row.
pub async fn seed_card(pool: &PgPool, external_id: &str, name: &str) -> Card {
    let set = SetRepo::upsert(
        pool,
        &UpsertSet {
            external_id: "swsh7".to_string(),
            name: "Evolving Skies".to_string(),
            series: None,
            release_date: None,
            total_cards: None,
        },
    )
    .await
    .unwrap();
    CardRepo::upsert(
        pool,
        set.id,
        &UpsertCard {
            external_id: external_id.to_string(),
            name: name.to_string(),
            number: None,
            rarity: None,
            variant: None,
            image_url: None,
        },
    )
    .await
    .unwrap()
}
