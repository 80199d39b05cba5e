//! Scryfall integration.
//!
//! Every external fetch (bulk feed catalog, bulk payload, single-card
//! lookups) goes through the [`CardSource`] trait so the import pipeline and
//! the write-through lookup can be exercised without network access.

mod client;
mod rate_limiter;
mod types;

pub use client::ScryfallClient;
pub use rate_limiter::MinIntervalLimiter;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::card::ExternalCard;

/// Errors that can occur when talking to the card data source.
#[derive(Debug, Error)]
pub enum ScryfallError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The bulk data catalog could not be listed.
    #[error("Bulk data catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// No bulk feed of the requested type is published.
    #[error("Bulk feed '{0}' not found in catalog")]
    FeedNotFound(String),

    /// The bulk payload download returned a non-success status.
    #[error("Bulk download failed with HTTP status {status}")]
    DownloadFailed { status: u16 },

    /// Rate limit exceeded (429).
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Card not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// How a card name is matched by the external lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    Fuzzy,
}

impl NameMatch {
    pub(crate) fn as_param(self) -> &'static str {
        match self {
            NameMatch::Exact => "exact",
            NameMatch::Fuzzy => "fuzzy",
        }
    }
}

/// Read-only access to the external card corpus.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// List the published bulk feeds.
    async fn list_bulk_feeds(&self) -> Result<Vec<BulkFeed>, ScryfallError>;

    /// Download a bulk payload completely into memory.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ScryfallError>;

    /// Fetch a single printing by its identifier.
    async fn card_by_id(&self, id: &str) -> Result<ExternalCard, ScryfallError>;

    /// Fetch a single card by name.
    async fn card_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<ExternalCard, ScryfallError>;

    /// Card name completions for a prefix. Failures yield an empty list.
    async fn autocomplete(&self, prefix: &str) -> Vec<String>;
}
