//! Types for the card store and its query engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::card::Card;

/// Field used to order search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Cmc,
    /// Market price (`price_tcg_player`).
    Price,
    Set,
}

impl SortField {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::Name => "c.name",
            SortField::Cmc => "c.cmc",
            SortField::Price => "c.price_tcg_player",
            SortField::Set => "c.set_code",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Conjunctive filters applied by every search tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Exact set code.
    #[serde(default)]
    pub set: Option<String>,
    /// Exact rarity.
    #[serde(default)]
    pub rarity: Option<String>,
    /// Substring of the comma-joined card types.
    #[serde(default)]
    pub type_contains: Option<String>,
    /// Every listed color must appear in the card's colors.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Format in which the card must be `legal` (e.g. "modern").
    #[serde(default)]
    pub format: Option<String>,
}

/// A paged card search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSearchQuery {
    /// Free text. Absent or blank text browses with filters only.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size; clamped by the store.
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl Default for CardSearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            filters: SearchFilters::default(),
            sort: SortField::default(),
            order: SortOrder::default(),
            page: default_page(),
            limit: None,
        }
    }
}

impl CardSearchQuery {
    /// Query matching `text` with default filters and paging.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Which strategy produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTier {
    /// Exact name equality.
    Exact,
    /// Full-text index.
    Indexed,
    /// Substring scan of the base table.
    Substring,
    /// No text tier applied: empty input, a filter-only browse, or no
    /// identification candidates.
    None,
}

impl SearchTier {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SearchTier::Exact => "exact",
            SearchTier::Indexed => "indexed",
            SearchTier::Substring => "substring",
            SearchTier::None => "none",
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPage {
    pub cards: Vec<Card>,
    /// Total matching rows across all pages.
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub tier: SearchTier,
}

impl CardPage {
    pub(crate) fn empty(page: u32) -> Self {
        Self {
            cards: Vec::new(),
            total: 0,
            page,
            total_pages: 0,
            tier: SearchTier::None,
        }
    }
}

/// Candidates for a recognized card name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyResult {
    pub cards: Vec<Card>,
    pub tier: SearchTier,
}

/// Catalog statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Number of stored printings.
    pub total_cards: u64,
    /// Number of distinct abstract cards.
    pub distinct_oracle_ids: u64,
    pub distinct_sets: u64,
    /// Most recent `updated_at` among stored rows.
    pub last_updated_at: Option<String>,
    /// Whether the full-text index exists.
    pub search_index_available: bool,
}

/// Errors from the card store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Card not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// The full-text index could not serve a query.
///
/// Callers fall back to a substring scan; this never reaches API consumers.
#[derive(Debug, Error)]
#[error("Search index unavailable: {0}")]
pub struct IndexUnavailable(pub String);

impl From<rusqlite::Error> for IndexUnavailable {
    fn from(e: rusqlite::Error) -> Self {
        IndexUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let query: CardSearchQuery = serde_json::from_str(r#"{"text": "bolt"}"#).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.sort, SortField::Name);
        assert_eq!(query.order, SortOrder::Asc);
        assert!(query.limit.is_none());
        assert!(query.filters.colors.is_empty());
    }

    #[test]
    fn test_sort_field_serialization() {
        let sort: SortField = serde_json::from_str(r#""price""#).unwrap();
        assert_eq!(sort, SortField::Price);
        assert_eq!(sort.column(), "c.price_tcg_player");
        assert_eq!(SortOrder::Desc.keyword(), "DESC");
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(SearchTier::Exact.label(), "exact");
        assert_eq!(SearchTier::Indexed.label(), "indexed");
        assert_eq!(SearchTier::Substring.label(), "substring");
        assert_eq!(
            serde_json::to_string(&SearchTier::Substring).unwrap(),
            r#""substring""#
        );
    }

    #[test]
    fn test_empty_page() {
        let page = CardPage::empty(3);
        assert!(page.cards.is_empty());
        assert_eq!(page.page, 3);
        assert_eq!(page.tier, SearchTier::None);
    }
}
