//! Card records as published by the external source.
//!
//! A record is either single-faced or multi-faced. The wire format encodes
//! that through an optional `card_faces` array; here it is decoded once into
//! an explicit primary-face struct plus a [`CardShape`], so normalization
//! never has to inspect optional fields to find out which kind it is looking at.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A card record from the bulk feed or the single-card endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCard")]
pub struct ExternalCard {
    /// Printing identifier.
    pub id: String,
    /// Abstract card identifier; absent for tokens, emblems and similar.
    pub oracle_id: Option<String>,
    pub name: String,
    /// Presentation layout ("normal", "transform", "token", ...).
    pub layout: Option<String>,
    /// Top-level textual fields.
    pub primary: FaceFields,
    pub shape: CardShape,
    pub cmc: Option<f64>,
    pub colors: Option<Vec<String>>,
    pub color_identity: Option<Vec<String>>,
    pub printing: Printing,
    pub prices: Prices,
    pub legalities: Option<BTreeMap<String, String>>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub loyalty: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl ExternalCard {
    /// Sub-faces in published order (empty for single-faced cards).
    pub fn faces(&self) -> &[CardFace] {
        match &self.shape {
            CardShape::SingleFaced => &[],
            CardShape::MultiFaced(faces) => faces,
        }
    }

    /// The first sub-face, if any.
    pub fn first_face(&self) -> Option<&CardFace> {
        self.faces().first()
    }
}

/// Whether a record carries sub-faces.
#[derive(Debug, Clone, PartialEq)]
pub enum CardShape {
    SingleFaced,
    /// Ordered sub-faces (front first).
    MultiFaced(Vec<CardFace>),
}

/// Fields that exist both on the record itself and on each sub-face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceFields {
    pub mana_cost: Option<String>,
    pub oracle_text: Option<String>,
    pub type_line: Option<String>,
    pub image_uris: Option<ImageUris>,
}

/// One face of a multi-faced card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardFace {
    pub name: String,
    pub fields: FaceFields,
}

/// Image URLs in the sizes the catalog keeps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageUris {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub normal: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

/// Printing-specific metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Printing {
    pub set_code: Option<String>,
    pub set_name: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub released_at: Option<String>,
    pub multiverse_ids: Vec<i64>,
    pub mtgo_id: Option<i64>,
}

/// Market prices as published (decimal strings).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Prices {
    #[serde(default)]
    pub usd: Option<String>,
    #[serde(default)]
    pub usd_foil: Option<String>,
    #[serde(default)]
    pub eur: Option<String>,
    #[serde(default)]
    pub tix: Option<String>,
}

// ============================================================================
// Wire format (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCard {
    id: String,
    #[serde(default)]
    oracle_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    layout: Option<String>,
    #[serde(default)]
    mana_cost: Option<String>,
    #[serde(default)]
    cmc: Option<f64>,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    type_line: Option<String>,
    #[serde(default)]
    colors: Option<Vec<String>>,
    #[serde(default)]
    color_identity: Option<Vec<String>>,
    #[serde(default)]
    set: Option<String>,
    #[serde(default)]
    set_name: Option<String>,
    #[serde(default)]
    collector_number: Option<String>,
    #[serde(default)]
    rarity: Option<String>,
    #[serde(default)]
    image_uris: Option<ImageUris>,
    #[serde(default)]
    card_faces: Option<Vec<RawFace>>,
    #[serde(default)]
    multiverse_ids: Option<Vec<i64>>,
    #[serde(default)]
    mtgo_id: Option<i64>,
    #[serde(default)]
    prices: Option<Prices>,
    #[serde(default)]
    legalities: Option<BTreeMap<String, String>>,
    #[serde(default)]
    power: Option<String>,
    #[serde(default)]
    toughness: Option<String>,
    #[serde(default)]
    loyalty: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    released_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFace {
    #[serde(default)]
    name: String,
    #[serde(default)]
    mana_cost: Option<String>,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    type_line: Option<String>,
    #[serde(default)]
    image_uris: Option<ImageUris>,
}

impl From<RawFace> for CardFace {
    fn from(raw: RawFace) -> Self {
        CardFace {
            name: raw.name,
            fields: FaceFields {
                mana_cost: raw.mana_cost,
                oracle_text: raw.oracle_text,
                type_line: raw.type_line,
                image_uris: raw.image_uris,
            },
        }
    }
}

impl From<RawCard> for ExternalCard {
    fn from(raw: RawCard) -> Self {
        let shape = match raw.card_faces {
            Some(faces) if !faces.is_empty() => {
                CardShape::MultiFaced(faces.into_iter().map(CardFace::from).collect())
            }
            _ => CardShape::SingleFaced,
        };

        ExternalCard {
            id: raw.id,
            oracle_id: raw.oracle_id,
            name: raw.name,
            layout: raw.layout,
            primary: FaceFields {
                mana_cost: raw.mana_cost,
                oracle_text: raw.oracle_text,
                type_line: raw.type_line,
                image_uris: raw.image_uris,
            },
            shape,
            cmc: raw.cmc,
            colors: raw.colors,
            color_identity: raw.color_identity,
            printing: Printing {
                set_code: raw.set,
                set_name: raw.set_name,
                collector_number: raw.collector_number,
                rarity: raw.rarity,
                released_at: raw.released_at,
                multiverse_ids: raw.multiverse_ids.unwrap_or_default(),
                mtgo_id: raw.mtgo_id,
            },
            prices: raw.prices.unwrap_or_default(),
            legalities: raw.legalities,
            power: raw.power,
            toughness: raw.toughness,
            loyalty: raw.loyalty,
            keywords: raw.keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_faced_record() {
        let json = r#"{
            "id": "c1",
            "oracle_id": "o1",
            "name": "Lightning Bolt",
            "layout": "normal",
            "mana_cost": "{R}",
            "type_line": "Instant",
            "set": "lea",
            "set_name": "Limited Edition Alpha",
            "prices": {"usd": "450.00", "eur": null},
            "some_future_field": {"nested": true}
        }"#;

        let card: ExternalCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.shape, CardShape::SingleFaced);
        assert!(card.faces().is_empty());
        assert_eq!(card.primary.mana_cost.as_deref(), Some("{R}"));
        assert_eq!(card.printing.set_code.as_deref(), Some("lea"));
        assert_eq!(card.prices.usd.as_deref(), Some("450.00"));
        assert!(card.prices.eur.is_none());
    }

    #[test]
    fn test_multi_faced_record_keeps_face_order() {
        let json = r#"{
            "id": "c2",
            "oracle_id": "o2",
            "name": "Delver of Secrets // Insectile Aberration",
            "layout": "transform",
            "card_faces": [
                {"name": "Delver of Secrets", "mana_cost": "{U}", "oracle_text": "Front"},
                {"name": "Insectile Aberration", "mana_cost": "", "oracle_text": "Flying"}
            ]
        }"#;

        let card: ExternalCard = serde_json::from_str(json).unwrap();
        let faces = card.faces();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].name, "Delver of Secrets");
        assert_eq!(faces[1].fields.oracle_text.as_deref(), Some("Flying"));
        assert!(card.primary.mana_cost.is_none());
    }

    #[test]
    fn test_empty_face_list_is_single_faced() {
        let json = r#"{"id": "c3", "name": "Plain", "card_faces": []}"#;
        let card: ExternalCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.shape, CardShape::SingleFaced);
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let json = r#"{"name": "No Id"}"#;
        let result: Result<ExternalCard, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
