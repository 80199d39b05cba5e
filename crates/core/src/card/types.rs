//! The normalized card row stored in the local catalog.

use serde::{Deserialize, Serialize};

/// One printing of a card, flattened into the shape of the `cards` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// External printing identifier (primary key).
    pub id: String,
    /// Identifier shared by every printing of the same abstract card.
    pub oracle_id: Option<String>,
    pub name: String,
    pub mana_cost: Option<String>,
    /// Converted mana value.
    pub cmc: Option<f64>,
    pub oracle_text: Option<String>,
    /// Comma-joined card types (e.g. "Artifact,Creature").
    pub types: String,
    /// Comma-joined subtypes (e.g. "Human,Wizard").
    pub subtypes: String,
    /// Comma-joined supertypes (e.g. "Legendary").
    pub supertypes: String,
    pub type_line: Option<String>,
    /// Comma-joined color letters.
    pub colors: Option<String>,
    pub color_identity: Option<String>,
    pub set_code: Option<String>,
    pub set_name: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub image_uri: Option<String>,
    pub image_uri_small: Option<String>,
    pub multiverse_id: Option<i64>,
    pub mtgo_id: Option<i64>,
    pub price_card_kingdom: Option<f64>,
    pub price_tcg_player: Option<f64>,
    pub price_star_city: Option<f64>,
    pub price_card_hoarder: Option<f64>,
    pub price_card_market: Option<f64>,
    /// JSON object mapping format name to legality status.
    pub legalities: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub loyalty: Option<String>,
    /// JSON list of keyword abilities.
    pub keywords: Option<String>,
    pub released_at: Option<String>,
    /// RFC 3339 timestamp of the last import write.
    pub updated_at: String,
}

impl Card {
    /// Legality status for a format, read from the stored JSON.
    pub fn legality(&self, format: &str) -> Option<String> {
        let legalities: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(self.legalities.as_deref()?).ok()?;
        legalities
            .get(format)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Keyword abilities decoded from the stored JSON.
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .and_then(|k| serde_json::from_str(k).ok())
            .unwrap_or_default()
    }
}
