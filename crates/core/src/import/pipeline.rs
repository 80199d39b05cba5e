//! Bulk import: locate, fetch, normalize, batch upsert, index.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use tracing::{debug, info, warn};

use super::feed::{fetch_feed, locate_feed};
use super::{ImportError, ImportReport, IngestStats};
use crate::card::{normalize, Card, ExternalCard, Normalized, SkipReason};
use crate::config::ImportConfig;
use crate::metrics::{BATCHES_COMMITTED, RECORDS_SKIPPED, ROWS_WRITTEN};
use crate::scryfall::CardSource;
use crate::store::CatalogWriter;

/// Records between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Runs one full import against a card source and a catalog writer.
///
/// Atomicity is per batch: if batch k fails, batches before it stay committed
/// and running the import again repairs the rest.
pub struct ImportPipeline {
    source: Arc<dyn CardSource>,
    writer: Arc<dyn CatalogWriter>,
    config: ImportConfig,
}

impl ImportPipeline {
    /// Create a new pipeline.
    pub fn new(
        source: Arc<dyn CardSource>,
        writer: Arc<dyn CatalogWriter>,
        config: ImportConfig,
    ) -> Self {
        Self {
            source,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Locate and download the feed, ingest it, then rebuild the search index.
    pub async fn run(&self) -> Result<ImportReport, ImportError> {
        let started_at = Utc::now();
        info!("Starting import of bulk feed '{}'", self.config.feed_type);

        let feed_url = locate_feed(self.source.as_ref(), &self.config.feed_type).await?;
        let feed_path = fetch_feed(self.source.as_ref(), &feed_url, &self.config.data_dir).await?;

        let payload = tokio::fs::read(&feed_path).await.map_err(|e| {
            ImportError::Io(format!("Failed to read {}: {}", feed_path.display(), e))
        })?;

        let stats = self.ingest(&payload, started_at).await?;

        info!("Building search index");
        self.blocking(|writer| {
            writer.create_search_index()?;
            writer.rebuild_search_index()
        })
        .await??;

        let total_rows = self.blocking(|writer| writer.count()).await??;
        let finished_at = Utc::now();

        info!(
            "Import complete: {} rows written in {} batches, {} skipped, {} rows in catalog",
            stats.rows_written,
            stats.batches,
            stats.skipped.values().sum::<u64>(),
            total_rows
        );

        Ok(ImportReport {
            feed_url,
            feed_path,
            feed_bytes: payload.len() as u64,
            records_seen: stats.records_seen,
            rows_written: stats.rows_written,
            batches: stats.batches,
            skipped: stats.skipped,
            total_rows,
            started_at,
            finished_at,
        })
    }

    /// Normalize every record of a payload and upsert the rows in batches.
    ///
    /// Each record is decoded on its own, so a malformed record is skipped
    /// instead of failing the import.
    pub async fn ingest(
        &self,
        payload: &[u8],
        imported_at: DateTime<Utc>,
    ) -> Result<IngestStats, ImportError> {
        let records: Vec<&RawValue> = serde_json::from_slice(payload)
            .map_err(|e| ImportError::Parse(format!("expected a JSON array of cards: {}", e)))?;

        info!("Processing {} records", records.len());

        let batch_size = self.config.batch_size.max(1);
        let mut stats = IngestStats::default();
        let mut batch: Vec<Card> = Vec::with_capacity(batch_size);

        for (position, raw) in records.into_iter().enumerate() {
            stats.records_seen += 1;

            let outcome = match serde_json::from_str::<ExternalCard>(raw.get()) {
                Ok(card) => normalize(&card, imported_at),
                Err(e) => {
                    warn!("Skipping malformed record at position {}: {}", position, e);
                    Normalized::Skip(SkipReason::Malformed(e.to_string()))
                }
            };

            match outcome {
                Normalized::Row(card) => batch.push(*card),
                Normalized::Skip(reason) => {
                    debug!("Skipping record at position {}: {}", position, reason);
                    RECORDS_SKIPPED.with_label_values(&[reason.label()]).inc();
                    stats.skip(&reason);
                }
            }

            if batch.len() >= batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                self.write_batch(full, &mut stats).await?;
            }

            if stats.records_seen % PROGRESS_INTERVAL == 0 {
                info!(
                    "Processed {} records ({} rows written)",
                    stats.records_seen, stats.rows_written
                );
            }
        }

        if !batch.is_empty() {
            self.write_batch(batch, &mut stats).await?;
        }

        Ok(stats)
    }

    async fn write_batch(&self, batch: Vec<Card>, stats: &mut IngestStats) -> Result<(), ImportError> {
        let batch_number = stats.batches + 1;

        let written = self
            .blocking(move |writer| writer.write_batch(&batch))
            .await?
            .map_err(|e| ImportError::BatchFailed {
                batch: batch_number,
                rows_committed: stats.rows_written,
                message: e.to_string(),
            })?;

        stats.batches = batch_number;
        stats.rows_written += written as u64;
        BATCHES_COMMITTED.inc();
        ROWS_WRITTEN.inc_by(written as u64);

        debug!("Committed batch {} ({} rows)", batch_number, written);
        Ok(())
    }

    /// Run a store call on the blocking pool.
    ///
    /// Awaiting it also yields to the runtime, so a deadline around the
    /// import can fire between batches.
    async fn blocking<T, F>(&self, f: F) -> Result<T, ImportError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CatalogWriter) -> T + Send + 'static,
    {
        let writer = Arc::clone(&self.writer);
        tokio::task::spawn_blocking(move || f(writer.as_ref()))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CardCatalog, SqliteCardStore};
    use crate::testing::{fixtures, MockCardSource};
    use serde_json::json;
    use tempfile::TempDir;

    fn pipeline(
        source: Arc<MockCardSource>,
        store: Arc<SqliteCardStore>,
        dir: &TempDir,
        batch_size: usize,
    ) -> ImportPipeline {
        let config = ImportConfig {
            data_dir: dir.path().to_path_buf(),
            batch_size,
            ..ImportConfig::default()
        };
        ImportPipeline::new(source, store, config)
    }

    #[tokio::test]
    async fn test_ingest_batches_and_skips() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCardStore::in_memory().unwrap());
        let pipeline = pipeline(Arc::new(MockCardSource::new()), store.clone(), &dir, 2);

        let payload = fixtures::feed_payload(&[
            fixtures::card_record("c1", "Lightning Bolt"),
            fixtures::token_record("t1", "Goblin"),
            fixtures::card_record("c2", "Lightning Helix"),
            json!({"name": "no id at all"}),
            fixtures::card_record("c3", "Counterspell"),
        ]);

        let stats = pipeline.ingest(&payload, Utc::now()).await.unwrap();

        assert_eq!(stats.records_seen, 5);
        assert_eq!(stats.rows_written, 3);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.skipped.get("missing_oracle_id"), Some(&1));
        assert_eq!(stats.skipped.get("malformed"), Some(&1));
        assert_eq!(store.count().unwrap(), 3);
        assert!(store.get("t1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_array_payload() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCardStore::in_memory().unwrap());
        let pipeline = pipeline(Arc::new(MockCardSource::new()), store, &dir, 1000);

        let err = pipeline
            .ingest(br#"{"object": "error"}"#, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[tokio::test]
    async fn test_run_builds_search_index() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(MockCardSource::new());
        source
            .set_bulk_feed(
                "default_cards",
                vec![
                    fixtures::card_record("c1", "Lightning Bolt"),
                    fixtures::double_faced_record("c2", "Delver of Secrets", "Insectile Aberration"),
                ],
            )
            .await;
        let store = Arc::new(SqliteCardStore::in_memory().unwrap());
        let pipeline = pipeline(source, store.clone(), &dir, 1000);

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.rows_written, 2);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.batches, 1);
        assert_eq!(report.skipped_total(), 0);
        assert!(report.feed_path.exists());
        assert!(store.search_index_available().unwrap());

        let result = store.identify("insectile", 20).unwrap();
        assert_eq!(result.cards.len(), 1);
        assert_eq!(result.cards[0].id, "c2");
    }

    #[tokio::test]
    async fn test_run_missing_feed_type() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(MockCardSource::new());
        source.set_bulk_feed("oracle_cards", vec![]).await;
        let store = Arc::new(SqliteCardStore::in_memory().unwrap());

        let err = pipeline(source, store, &dir, 1000).run().await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Source(crate::scryfall::ScryfallError::FeedNotFound(_))
        ));
    }
}
