//! Bulk import of the external card corpus into the local catalog.
//!
//! Data flow:
//! - **Locate**: find the download URL of the configured bulk feed
//! - **Fetch**: download the payload and keep a local copy
//! - **Normalize**: turn each record into a catalog row or a skip
//! - **Upsert**: write rows in fixed-size transactions
//! - **Index**: recreate and rebuild the full-text index

mod feed;
mod job;
mod pipeline;
mod types;

pub use feed::{fetch_feed, locate_feed, FEED_FILE_NAME};
pub use job::ImportJob;
pub use pipeline::{ImportPipeline, PROGRESS_INTERVAL};
pub use types::{ImportError, ImportReport, IngestStats};
