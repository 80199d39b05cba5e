//! Local card catalog: SQLite storage, full-text index and tiered search.
//!
//! Reads go through [`CardCatalog`], ingestion through [`CatalogWriter`].
//! Both are implemented by [`SqliteCardStore`].

mod index;
mod match_expr;
mod schema;
mod search;
mod sqlite;
mod types;

pub use match_expr::fts_match_expression;
pub use sqlite::SqliteCardStore;
pub use types::*;

use crate::card::Card;

/// Read side of the catalog.
pub trait CardCatalog: Send + Sync {
    /// Get a printing by its external identifier.
    fn get(&self, id: &str) -> Result<Option<Card>, StoreError>;

    /// Get a printing whose name equals `name` exactly.
    fn get_by_name(&self, name: &str) -> Result<Option<Card>, StoreError>;

    /// Paged text search with filters.
    ///
    /// Uses the full-text index when it can and falls back to a substring
    /// scan when it cannot. Index failures are never returned.
    fn search(&self, query: &CardSearchQuery) -> Result<CardPage, StoreError>;

    /// Candidate printings for a recognized card name.
    ///
    /// Tries exact equality, then the full-text index, then a substring scan.
    /// A `limit` of 0 uses the configured default.
    fn identify(&self, name: &str, limit: usize) -> Result<IdentifyResult, StoreError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, StoreError>;
}

/// Write side of the catalog, used by ingestion.
pub trait CatalogWriter: Send + Sync {
    /// Upsert rows in a single transaction. Returns the number written.
    ///
    /// Either every row of the batch is committed or none is.
    fn write_batch(&self, cards: &[Card]) -> Result<usize, StoreError>;

    /// Drop and recreate the (empty) full-text index.
    fn create_search_index(&self) -> Result<(), StoreError>;

    /// Repopulate the full-text index from every stored row.
    fn rebuild_search_index(&self) -> Result<(), StoreError>;

    /// Add one stored row to the full-text index.
    fn index_card(&self, id: &str) -> Result<(), IndexUnavailable>;

    /// Number of stored rows.
    fn count(&self) -> Result<u64, StoreError>;
}
