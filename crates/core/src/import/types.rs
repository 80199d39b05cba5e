//! Types for the import pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::card::SkipReason;
use crate::scryfall::ScryfallError;
use crate::store::StoreError;

/// Errors that can occur during an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The external source failed (catalog, feed lookup or download).
    #[error("source error: {0}")]
    Source(#[from] ScryfallError),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The payload is not a JSON array of records.
    #[error("invalid bulk payload: {0}")]
    Parse(String),

    /// A batch could not be written. Earlier batches stay committed.
    #[error("batch {batch} failed after {rows_committed} committed rows: {message}")]
    BatchFailed {
        batch: u64,
        rows_committed: u64,
        message: String,
    },

    /// Card store error outside batch writes (index build, counting).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Another import is in flight.
    #[error("an import is already running")]
    AlreadyRunning,

    /// The import exceeded its deadline. Committed batches are kept.
    #[error("import timed out after {after_secs}s")]
    TimedOut { after_secs: u64 },

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),
}

impl ImportError {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ImportError::AlreadyRunning => "already_running",
            ImportError::TimedOut { .. } => "timed_out",
            _ => "failed",
        }
    }
}

/// Summary of a completed import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// URL the payload was downloaded from.
    pub feed_url: String,
    /// Local copy of the payload.
    pub feed_path: PathBuf,
    /// Payload size in bytes.
    pub feed_bytes: u64,
    /// Records found in the payload.
    pub records_seen: u64,
    /// Rows upserted.
    pub rows_written: u64,
    /// Transactions committed.
    pub batches: u64,
    /// Skipped records by reason label.
    pub skipped: BTreeMap<String, u64>,
    /// Rows in the catalog after the import.
    pub total_rows: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    /// Total skipped records across all reasons.
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Skipped records for one reason label.
    pub fn skipped_for(&self, label: &str) -> u64 {
        self.skipped.get(label).copied().unwrap_or(0)
    }
}

/// Counters accumulated while ingesting a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub records_seen: u64,
    pub rows_written: u64,
    pub batches: u64,
    pub skipped: BTreeMap<String, u64>,
}

impl IngestStats {
    pub(crate) fn skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.label().to_string()).or_insert(0) += 1;
    }
}
