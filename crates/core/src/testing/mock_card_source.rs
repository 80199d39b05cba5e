//! Mock card source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::card::ExternalCard;
use crate::scryfall::{BulkFeed, CardSource, NameMatch, ScryfallError};

/// A recorded source call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedSourceCall {
    ListBulkFeeds,
    Download { url: String },
    CardById { id: String },
    CardByName { name: String, mode: NameMatch },
    Autocomplete { prefix: String },
}

/// Mock implementation of the CardSource trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable bulk catalog and payloads
/// - Serve single records by id or name
/// - Track calls for assertions
/// - Simulate failures and slow downloads
///
/// # Example
///
/// ```rust,ignore
/// use cardvault_core::testing::{fixtures, MockCardSource};
///
/// let source = MockCardSource::new();
/// source
///     .set_bulk_feed("default_cards", vec![fixtures::card_record("c1", "Lightning Bolt")])
///     .await;
///
/// let feeds = source.list_bulk_feeds().await?;
/// assert_eq!(feeds.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockCardSource {
    /// Published bulk feeds.
    feeds: Arc<RwLock<Vec<BulkFeed>>>,
    /// Payload bytes by download URL.
    payloads: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Single records (wire JSON) by id.
    records: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    /// Delay applied to every download.
    download_delay: Arc<RwLock<Option<Duration>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedSourceCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ScryfallError>>>,
}

impl Default for MockCardSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCardSource {
    /// Create a new empty mock source.
    pub fn new() -> Self {
        Self {
            feeds: Arc::new(RwLock::new(Vec::new())),
            payloads: Arc::new(RwLock::new(HashMap::new())),
            records: Arc::new(RwLock::new(HashMap::new())),
            download_delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Bulk Configuration
    // =========================================================================

    /// Publish a feed of `feed_type` whose payload is `records` as a JSON array.
    pub async fn set_bulk_feed(&self, feed_type: &str, records: Vec<serde_json::Value>) {
        let url = super::fixtures::feed_url(feed_type);
        self.add_feed(super::fixtures::bulk_feed(feed_type, &url))
            .await;
        self.set_payload(&url, super::fixtures::feed_payload(&records))
            .await;
    }

    /// Add a catalog entry without a payload.
    pub async fn add_feed(&self, feed: BulkFeed) {
        let mut feeds = self.feeds.write().await;
        feeds.retain(|f| f.feed_type != feed.feed_type);
        feeds.push(feed);
    }

    /// Set the raw payload served for `url`.
    pub async fn set_payload(&self, url: &str, bytes: Vec<u8>) {
        self.payloads.write().await.insert(url.to_string(), bytes);
    }

    /// Delay every download by `delay`.
    pub async fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.write().await = Some(delay);
    }

    // =========================================================================
    // Single-Record Configuration
    // =========================================================================

    /// Serve `record` from the single-card endpoints.
    ///
    /// The record must carry string `id` and `name` fields.
    pub async fn add_record(&self, record: serde_json::Value) {
        let id = record
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.records.write().await.insert(id, record);
    }

    /// Clear all single records.
    pub async fn clear_records(&self) {
        self.records.write().await.clear();
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedSourceCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Get the number of calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ScryfallError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    async fn take_error(&self) -> Option<ScryfallError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, call: RecordedSourceCall) {
        self.calls.write().await.push(call);
    }

    fn parse(record: &serde_json::Value) -> Result<ExternalCard, ScryfallError> {
        serde_json::from_value(record.clone())
            .map_err(|e| ScryfallError::ParseError(format!("Failed to parse card: {}", e)))
    }

    fn name_of(record: &serde_json::Value) -> &str {
        record
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CardSource for MockCardSource {
    async fn list_bulk_feeds(&self) -> Result<Vec<BulkFeed>, ScryfallError> {
        self.record(RecordedSourceCall::ListBulkFeeds).await;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(self.feeds.read().await.clone())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ScryfallError> {
        self.record(RecordedSourceCall::Download {
            url: url.to_string(),
        })
        .await;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let delay = *self.download_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.payloads
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or(ScryfallError::DownloadFailed { status: 404 })
    }

    async fn card_by_id(&self, id: &str) -> Result<ExternalCard, ScryfallError> {
        self.record(RecordedSourceCall::CardById { id: id.to_string() })
            .await;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let records = self.records.read().await;
        let record = records
            .get(id)
            .ok_or_else(|| ScryfallError::NotFound(id.to_string()))?;
        Self::parse(record)
    }

    async fn card_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<ExternalCard, ScryfallError> {
        self.record(RecordedSourceCall::CardByName {
            name: name.to_string(),
            mode,
        })
        .await;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let records = self.records.read().await;
        let name_lower = name.to_lowercase();
        let record = records
            .values()
            .find(|r| match mode {
                NameMatch::Exact => Self::name_of(r).eq_ignore_ascii_case(name),
                NameMatch::Fuzzy => Self::name_of(r).to_lowercase().contains(&name_lower),
            })
            .ok_or_else(|| ScryfallError::NotFound(name.to_string()))?;
        Self::parse(record)
    }

    async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        self.record(RecordedSourceCall::Autocomplete {
            prefix: prefix.to_string(),
        })
        .await;

        if self.take_error().await.is_some() {
            return Vec::new();
        }

        let prefix_lower = prefix.to_lowercase();
        let mut names: Vec<String> = self
            .records
            .read()
            .await
            .values()
            .map(Self::name_of)
            .filter(|n| n.to_lowercase().starts_with(&prefix_lower))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_bulk_feed_roundtrip() {
        let source = MockCardSource::new();
        source
            .set_bulk_feed(
                "default_cards",
                vec![fixtures::card_record("c1", "Lightning Bolt")],
            )
            .await;

        let feeds = source.list_bulk_feeds().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].feed_type, "default_cards");

        let bytes = source.download(&feeds[0].download_uri).await.unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_payload_fails() {
        let source = MockCardSource::new();
        let err = source.download("http://nowhere").await.unwrap_err();
        assert!(matches!(err, ScryfallError::DownloadFailed { status: 404 }));
    }

    #[tokio::test]
    async fn test_card_lookups() {
        let source = MockCardSource::new();
        source
            .add_record(fixtures::card_record("c1", "Lightning Bolt"))
            .await;

        assert_eq!(source.card_by_id("c1").await.unwrap().name, "Lightning Bolt");
        assert!(matches!(
            source.card_by_id("c2").await,
            Err(ScryfallError::NotFound(_))
        ));
        assert_eq!(
            source
                .card_by_name("lightning bolt", NameMatch::Exact)
                .await
                .unwrap()
                .id,
            "c1"
        );
        assert!(source.card_by_name("bolt", NameMatch::Exact).await.is_err());
        assert!(source.card_by_name("bolt", NameMatch::Fuzzy).await.is_ok());
        assert_eq!(source.autocomplete("light").await, vec!["Lightning Bolt"]);
        assert_eq!(source.call_count().await, 6);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let source = MockCardSource::new();
        source
            .set_next_error(ScryfallError::CatalogUnavailable("down".to_string()))
            .await;

        assert!(source.list_bulk_feeds().await.is_err());
        assert!(source.list_bulk_feeds().await.is_ok());
        assert_eq!(
            source.recorded_calls().await,
            vec![
                RecordedSourceCall::ListBulkFeeds,
                RecordedSourceCall::ListBulkFeeds
            ]
        );
    }
}
