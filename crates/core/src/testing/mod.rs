//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`crate::scryfall::CardSource`] and fixtures
//! so the import pipeline and lookups can be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use cardvault_core::testing::{fixtures, MockCardSource};
//!
//! let source = MockCardSource::new();
//! source
//!     .set_bulk_feed("default_cards", vec![fixtures::card_record("c1", "Lightning Bolt")])
//!     .await;
//! ```

mod mock_card_source;

pub use mock_card_source::{MockCardSource, RecordedSourceCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::card::Card;
    use crate::scryfall::BulkFeed;

    /// Timestamp used by [`card`].
    pub const FIXTURE_UPDATED_AT: &str = "2024-01-01T00:00:00.000Z";

    /// Create a catalog row with reasonable defaults.
    pub fn card(id: &str, name: &str) -> Card {
        Card {
            id: id.to_string(),
            oracle_id: Some(format!("oracle-{}", id)),
            name: name.to_string(),
            mana_cost: None,
            cmc: None,
            oracle_text: None,
            types: String::new(),
            subtypes: String::new(),
            supertypes: String::new(),
            type_line: None,
            colors: None,
            color_identity: None,
            set_code: None,
            set_name: None,
            collector_number: None,
            rarity: None,
            image_uri: None,
            image_uri_small: None,
            multiverse_id: None,
            mtgo_id: None,
            price_card_kingdom: None,
            price_tcg_player: None,
            price_star_city: None,
            price_card_hoarder: None,
            price_card_market: None,
            legalities: None,
            power: None,
            toughness: None,
            loyalty: None,
            keywords: None,
            released_at: None,
            updated_at: FIXTURE_UPDATED_AT.to_string(),
        }
    }

    /// Create a single-faced external record as the source publishes it.
    pub fn card_record(id: &str, name: &str) -> Value {
        json!({
            "object": "card",
            "id": id,
            "oracle_id": format!("oracle-{}", id),
            "name": name,
            "lang": "en",
            "layout": "normal",
            "mana_cost": "{R}",
            "cmc": 1.0,
            "type_line": "Instant",
            "oracle_text": format!("{} deals 3 damage to any target.", name),
            "colors": ["R"],
            "color_identity": ["R"],
            "keywords": [],
            "legalities": {"modern": "legal", "standard": "not_legal"},
            "set": "tst",
            "set_name": "Test Set",
            "collector_number": "1",
            "rarity": "common",
            "released_at": "2024-01-01",
            "image_uris": {
                "small": format!("https://img.example/{}/small.jpg", id),
                "normal": format!("https://img.example/{}/normal.jpg", id),
                "large": format!("https://img.example/{}/large.jpg", id)
            },
            "multiverse_ids": [1000],
            "prices": {"usd": "1.25", "usd_foil": null, "eur": "1.10", "tix": "0.02"}
        })
    }

    /// Create a two-faced (transform) external record.
    pub fn double_faced_record(id: &str, front: &str, back: &str) -> Value {
        json!({
            "id": id,
            "oracle_id": format!("oracle-{}", id),
            "name": format!("{} // {}", front, back),
            "layout": "transform",
            "cmc": 1.0,
            "type_line": "Creature — Human Wizard // Creature — Human Insect",
            "card_faces": [
                {
                    "name": front,
                    "mana_cost": "{U}",
                    "type_line": "Creature — Human Wizard",
                    "oracle_text": "At the beginning of your upkeep, look at the top card.",
                    "image_uris": {"small": "front-small.jpg", "normal": "front-normal.jpg"}
                },
                {
                    "name": back,
                    "mana_cost": "",
                    "type_line": "Creature — Human Insect",
                    "oracle_text": "Flying",
                    "image_uris": {"small": "back-small.jpg", "normal": "back-normal.jpg"}
                }
            ],
            "set": "isd",
            "rarity": "common",
            "prices": {"usd": "0.25"}
        })
    }

    /// Create a token record, which is never catalogued.
    pub fn token_record(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "layout": "token",
            "type_line": "Token Creature — Goblin"
        })
    }

    /// Download URL used for a fixture feed.
    pub fn feed_url(feed_type: &str) -> String {
        format!("https://data.example/bulk/{}.json", feed_type)
    }

    /// Create a bulk catalog entry.
    pub fn bulk_feed(feed_type: &str, download_uri: &str) -> BulkFeed {
        BulkFeed {
            feed_type: feed_type.to_string(),
            download_uri: download_uri.to_string(),
            name: Some(feed_type.replace('_', " ")),
            description: None,
            updated_at: None,
            size: None,
        }
    }

    /// Serialize records as a bulk payload (JSON array).
    pub fn feed_payload(records: &[Value]) -> Vec<u8> {
        serde_json::to_vec(records).unwrap_or_default()
    }
}
