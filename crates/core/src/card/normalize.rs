//! Mapping from external card records to catalog rows.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::external::{ExternalCard, ImageUris};
use super::type_line::parse_type_line;
use super::Card;

/// Layouts that describe game objects rather than playable cards.
pub const EXCLUDED_LAYOUTS: &[&str] = &["art_series", "token", "double_faced_token", "emblem"];

/// Separator placed between sub-face rules texts.
pub const FACE_TEXT_SEPARATOR: &str = "\n---\n";

/// Why a record was not turned into a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    MissingOracleId,
    ExcludedLayout(String),
    /// The record could not be decoded at all.
    Malformed(String),
}

impl SkipReason {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingOracleId => "missing_oracle_id",
            SkipReason::ExcludedLayout(_) => "excluded_layout",
            SkipReason::Malformed(_) => "malformed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingOracleId => write!(f, "record has no oracle_id"),
            SkipReason::ExcludedLayout(layout) => write!(f, "layout '{}' is excluded", layout),
            SkipReason::Malformed(err) => write!(f, "malformed record: {}", err),
        }
    }
}

/// Outcome of normalizing one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Row(Box<Card>),
    Skip(SkipReason),
}

/// Decide whether a record is stored at all.
pub fn skip_reason(card: &ExternalCard) -> Option<SkipReason> {
    if present(&card.oracle_id).is_none() {
        return Some(SkipReason::MissingOracleId);
    }
    match card.layout.as_deref() {
        Some(layout) if EXCLUDED_LAYOUTS.contains(&layout) => {
            Some(SkipReason::ExcludedLayout(layout.to_string()))
        }
        _ => None,
    }
}

/// Turn an external record into a catalog row, or a skip decision.
///
/// `imported_at` becomes the row's `updated_at`; passing it in keeps this
/// function free of clocks and I/O.
pub fn normalize(card: &ExternalCard, imported_at: DateTime<Utc>) -> Normalized {
    if let Some(reason) = skip_reason(card) {
        return Normalized::Skip(reason);
    }

    let type_line = parse_type_line(present(&card.primary.type_line));
    let first_face = card.first_face().map(|f| &f.fields);

    let mana_cost = present(&card.primary.mana_cost)
        .or_else(|| first_face.and_then(|f| present(&f.mana_cost)))
        .map(str::to_string);

    let image_uri = image(card, |uris| &uris.normal);
    let image_uri_small = image(card, |uris| &uris.small);

    let row = Card {
        id: card.id.clone(),
        oracle_id: present(&card.oracle_id).map(str::to_string),
        name: card.name.clone(),
        mana_cost,
        cmc: card.cmc,
        oracle_text: oracle_text(card),
        types: type_line.types_joined(),
        subtypes: type_line.subtypes_joined(),
        supertypes: type_line.supertypes_joined(),
        type_line: present(&card.primary.type_line).map(str::to_string),
        colors: join_tokens(card.colors.as_deref()),
        color_identity: join_tokens(card.color_identity.as_deref()),
        set_code: card.printing.set_code.clone(),
        set_name: card.printing.set_name.clone(),
        collector_number: card.printing.collector_number.clone(),
        rarity: card.printing.rarity.clone(),
        image_uri,
        image_uri_small,
        multiverse_id: card
            .printing
            .multiverse_ids
            .first()
            .copied()
            .filter(|id| *id != 0),
        mtgo_id: card.printing.mtgo_id.filter(|id| *id != 0),
        price_card_kingdom: None,
        price_tcg_player: parse_price(card.prices.usd.as_deref()),
        price_star_city: None,
        price_card_hoarder: parse_price(card.prices.tix.as_deref()),
        price_card_market: parse_price(card.prices.eur.as_deref()),
        legalities: card
            .legalities
            .as_ref()
            .and_then(|l| serde_json::to_string(l).ok()),
        power: present(&card.power).map(str::to_string),
        toughness: present(&card.toughness).map(str::to_string),
        loyalty: present(&card.loyalty).map(str::to_string),
        keywords: card
            .keywords
            .as_ref()
            .and_then(|k| serde_json::to_string(k).ok()),
        released_at: present(&card.printing.released_at).map(str::to_string),
        updated_at: imported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    Normalized::Row(Box::new(row))
}

/// Parse a published decimal price. Absent or unparseable prices stay absent.
pub fn parse_price(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn oracle_text(card: &ExternalCard) -> Option<String> {
    if let Some(text) = present(&card.primary.oracle_text) {
        return Some(text.to_string());
    }
    let faces = card.faces();
    if faces.is_empty() {
        return None;
    }
    let joined = faces
        .iter()
        .map(|f| f.fields.oracle_text.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(FACE_TEXT_SEPARATOR);
    (!joined.is_empty()).then_some(joined)
}

fn image(card: &ExternalCard, size: fn(&ImageUris) -> &Option<String>) -> Option<String> {
    fn pick<'a>(
        uris: &'a Option<ImageUris>,
        size: fn(&ImageUris) -> &Option<String>,
    ) -> Option<&'a str> {
        uris.as_ref().and_then(|u| present(size(u)))
    }

    pick(&card.primary.image_uris, size)
        .or_else(|| {
            card.first_face()
                .and_then(|f| pick(&f.fields.image_uris, size))
        })
        .map(str::to_string)
}

fn join_tokens(tokens: Option<&[String]>) -> Option<String> {
    tokens
        .filter(|t| !t.is_empty())
        .map(|t| t.join(","))
}

/// Empty strings count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn imported_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn card(value: serde_json::Value) -> ExternalCard {
        serde_json::from_value(value).unwrap()
    }

    fn row(value: serde_json::Value) -> Card {
        match normalize(&card(value), imported_at()) {
            Normalized::Row(row) => *row,
            Normalized::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_skip_missing_oracle_id() {
        let result = normalize(
            &card(json!({"id": "t1", "name": "Goblin", "layout": "normal"})),
            imported_at(),
        );
        assert_eq!(result, Normalized::Skip(SkipReason::MissingOracleId));
    }

    #[test]
    fn test_skip_rules_are_ordered() {
        // No oracle id and a token layout: the oracle id rule fires first
        let result = normalize(
            &card(json!({"id": "t1", "name": "Goblin", "layout": "token"})),
            imported_at(),
        );
        assert_eq!(result, Normalized::Skip(SkipReason::MissingOracleId));
    }

    #[test]
    fn test_skip_excluded_layouts() {
        for layout in EXCLUDED_LAYOUTS {
            let result = normalize(
                &card(json!({"id": "x", "oracle_id": "o", "name": "X", "layout": layout})),
                imported_at(),
            );
            assert_eq!(
                result,
                Normalized::Skip(SkipReason::ExcludedLayout(layout.to_string()))
            );
        }
    }

    #[test]
    fn test_single_faced_card() {
        let row = row(json!({
            "id": "c1",
            "oracle_id": "o1",
            "name": "Jace, Vryn's Prodigy",
            "layout": "normal",
            "mana_cost": "{1}{U}",
            "cmc": 2.0,
            "oracle_text": "Draw a card.",
            "type_line": "Legendary Creature — Human Wizard",
            "colors": ["U"],
            "color_identity": ["U"],
            "set": "ori",
            "set_name": "Magic Origins",
            "collector_number": "60",
            "rarity": "mythic",
            "image_uris": {"small": "s.jpg", "normal": "n.jpg"},
            "multiverse_ids": [398442],
            "mtgo_id": 57594,
            "prices": {"usd": "12.50", "eur": "10.00", "tix": "1.5"},
            "legalities": {"modern": "legal", "standard": "not_legal"},
            "power": "0",
            "toughness": "2",
            "keywords": ["Transform"],
            "released_at": "2015-07-17"
        }));

        assert_eq!(row.id, "c1");
        assert_eq!(row.mana_cost.as_deref(), Some("{1}{U}"));
        assert_eq!(row.cmc, Some(2.0));
        assert_eq!(row.supertypes, "Legendary");
        assert_eq!(row.types, "Creature");
        assert_eq!(row.subtypes, "Human,Wizard");
        assert_eq!(row.colors.as_deref(), Some("U"));
        assert_eq!(row.set_code.as_deref(), Some("ori"));
        assert_eq!(row.image_uri.as_deref(), Some("n.jpg"));
        assert_eq!(row.image_uri_small.as_deref(), Some("s.jpg"));
        assert_eq!(row.multiverse_id, Some(398442));
        assert_eq!(row.mtgo_id, Some(57594));
        assert_eq!(row.price_tcg_player, Some(12.5));
        assert_eq!(row.price_card_market, Some(10.0));
        assert_eq!(row.price_card_hoarder, Some(1.5));
        assert_eq!(row.price_card_kingdom, None);
        assert_eq!(row.price_star_city, None);
        assert_eq!(row.legality("modern").as_deref(), Some("legal"));
        assert_eq!(row.keyword_list(), vec!["Transform"]);
        assert_eq!(row.updated_at, "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_multi_faced_card_uses_faces() {
        let row = row(json!({
            "id": "c2",
            "oracle_id": "o2",
            "name": "Delver of Secrets // Insectile Aberration",
            "layout": "transform",
            "type_line": "Creature — Human Wizard // Creature — Human Insect",
            "card_faces": [
                {
                    "name": "Delver of Secrets",
                    "mana_cost": "{U}",
                    "oracle_text": "Look at the top card.",
                    "image_uris": {"small": "front-s.jpg", "normal": "front-n.jpg"}
                },
                {
                    "name": "Insectile Aberration",
                    "mana_cost": "",
                    "oracle_text": "Flying",
                    "image_uris": {"small": "back-s.jpg", "normal": "back-n.jpg"}
                }
            ]
        }));

        assert_eq!(row.mana_cost.as_deref(), Some("{U}"));
        assert_eq!(
            row.oracle_text.as_deref(),
            Some("Look at the top card.\n---\nFlying")
        );
        assert_eq!(row.image_uri.as_deref(), Some("front-n.jpg"));
        assert_eq!(row.image_uri_small.as_deref(), Some("front-s.jpg"));
        assert_eq!(row.subtypes, "Human,Wizard,Insect");
    }

    #[test]
    fn test_top_level_fields_win_over_faces() {
        let row = row(json!({
            "id": "c3",
            "oracle_id": "o3",
            "name": "Fire // Ice",
            "layout": "split",
            "mana_cost": "{1}{R} // {1}{U}",
            "oracle_text": "Combined text",
            "image_uris": {"normal": "split.jpg"},
            "card_faces": [
                {"name": "Fire", "mana_cost": "{1}{R}", "oracle_text": "Fire text"},
                {"name": "Ice", "mana_cost": "{1}{U}", "oracle_text": "Ice text"}
            ]
        }));

        assert_eq!(row.mana_cost.as_deref(), Some("{1}{R} // {1}{U}"));
        assert_eq!(row.oracle_text.as_deref(), Some("Combined text"));
        assert_eq!(row.image_uri.as_deref(), Some("split.jpg"));
        assert!(row.image_uri_small.is_none());
    }

    #[test]
    fn test_empty_strings_and_lists_become_null() {
        let row = row(json!({
            "id": "c4",
            "oracle_id": "o4",
            "name": "Island",
            "layout": "normal",
            "mana_cost": "",
            "type_line": "Basic Land — Island",
            "colors": [],
            "multiverse_ids": [],
            "prices": {"usd": null, "eur": "", "tix": "n/a"}
        }));

        assert!(row.mana_cost.is_none());
        assert!(row.oracle_text.is_none());
        assert!(row.colors.is_none());
        assert!(row.multiverse_id.is_none());
        assert!(row.price_tcg_player.is_none());
        assert!(row.price_card_market.is_none());
        assert!(row.price_card_hoarder.is_none());
        assert!(row.legalities.is_none());
        assert!(row.keywords.is_none());
        assert_eq!(row.supertypes, "Basic");
        assert_eq!(row.types, "Land");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some("12.50")), Some(12.5));
        assert_eq!(parse_price(Some("0.05")), Some(0.05));
        assert_eq!(parse_price(None), None);
        assert_eq!(parse_price(Some("")), None);
        assert_eq!(parse_price(Some("abc")), None);
        assert_eq!(parse_price(Some("NaN")), None);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let record = card(json!({
            "id": "c5",
            "oracle_id": "o5",
            "name": "Counterspell",
            "mana_cost": "{U}{U}",
            "legalities": {"vintage": "legal", "legacy": "legal"}
        }));
        assert_eq!(
            normalize(&record, imported_at()),
            normalize(&record, imported_at())
        );
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::MissingOracleId.label(), "missing_oracle_id");
        assert_eq!(
            SkipReason::ExcludedLayout("token".to_string()).label(),
            "excluded_layout"
        );
        assert_eq!(
            SkipReason::Malformed("bad".to_string()).to_string(),
            "malformed record: bad"
        );
    }
}
