//! Types for Scryfall API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the bulk data catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkFeed {
    /// Feed type ("oracle_cards", "default_cards", "all_cards", ...).
    #[serde(rename = "type")]
    pub feed_type: String,
    /// Where the payload can be downloaded.
    pub download_uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the feed was last regenerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Payload size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Response of the bulk data catalog endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct BulkCatalogResponse {
    #[serde(default)]
    pub data: Vec<BulkFeed>,
}

/// Response of the autocomplete endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct AutocompleteResponse {
    #[serde(default)]
    pub data: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_catalog_parsing() {
        let json = r#"{
            "object": "list",
            "has_more": false,
            "data": [
                {
                    "object": "bulk_data",
                    "type": "oracle_cards",
                    "name": "Oracle Cards",
                    "download_uri": "https://data.example/oracle.json",
                    "updated_at": "2024-05-01T09:10:11.123+00:00",
                    "size": 150000000
                },
                {
                    "object": "bulk_data",
                    "type": "default_cards",
                    "download_uri": "https://data.example/default.json"
                }
            ]
        }"#;

        let catalog: BulkCatalogResponse = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.data.len(), 2);
        assert_eq!(catalog.data[0].feed_type, "oracle_cards");
        assert_eq!(catalog.data[0].size, Some(150_000_000));
        assert!(catalog.data[0].updated_at.is_some());
        assert_eq!(catalog.data[1].download_uri, "https://data.example/default.json");
        assert!(catalog.data[1].name.is_none());
    }

    #[test]
    fn test_autocomplete_parsing() {
        let json = r#"{"object": "catalog", "total_values": 2, "data": ["Bolt", "Boltwing"]}"#;
        let response: AutocompleteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data, vec!["Bolt", "Boltwing"]);
    }
}
