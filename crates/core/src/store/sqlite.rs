//! SQLite-backed card store.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{named_params, params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::schema::{row_to_card, CARD_COLUMNS, CREATE_TABLES, UPSERT_CARD};
use super::search::{self, PageLimits};
use super::{
    index, CardCatalog, CardPage, CardSearchQuery, CatalogStats, CatalogWriter, IdentifyResult,
    IndexUnavailable, StoreError,
};
use crate::card::Card;
use crate::config::SearchConfig;

/// Read-only connections opened next to the writer for file databases.
const READ_CONNECTIONS: usize = 4;

/// SQLite-backed card catalog.
///
/// Writes go through a single connection. File databases also keep a few
/// read-only connections so searches run concurrently with each other and
/// with an import (WAL mode). In-memory stores read through the writer.
pub struct SqliteCardStore {
    conn: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    limits: PageLimits,
}

impl SqliteCardStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Opened card store at {} (journal_mode={})", path.display(), mode);

        let mut store = Self::from_connection(conn)?;
        for _ in 0..READ_CONNECTIONS {
            store.readers.push(Mutex::new(open_reader(path)?));
        }
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLES)?;
        let defaults = SearchConfig::default();
        Ok(Self {
            conn: Mutex::new(conn),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
            limits: PageLimits {
                default_limit: defaults.default_limit,
                max_limit: defaults.max_limit,
                identify_limit: defaults.identify_limit,
            },
        })
    }

    /// Use the page size bounds from `config`.
    pub fn with_search_config(mut self, config: &SearchConfig) -> Self {
        self.limits = PageLimits {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            identify_limit: config.identify_limit,
        };
        self
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Internal("card store connection lock poisoned".to_string()))
    }

    /// A connection for read-only queries: an idle reader if there is one.
    fn read(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        if self.readers.is_empty() {
            return self.lock();
        }

        let start = self.next_reader.fetch_add(1, Ordering::Relaxed);
        let count = self.readers.len();
        for offset in 0..count {
            if let Ok(guard) = self.readers[(start + offset) % count].try_lock() {
                return Ok(guard);
            }
        }

        self.readers[start % count]
            .lock()
            .map_err(|_| StoreError::Internal("card store reader lock poisoned".to_string()))
    }

    /// Whether the full-text index exists.
    pub fn search_index_available(&self) -> Result<bool, StoreError> {
        let conn = self.read()?;
        Ok(index::available(&conn)?)
    }

    fn get_where(&self, column: &str, value: &str) -> Result<Option<Card>, StoreError> {
        let conn = self.read()?;
        let card = conn
            .query_row(
                &format!(
                    "SELECT {} FROM cards c WHERE c.{} = ?1 \
                     ORDER BY c.released_at DESC, c.id ASC LIMIT 1",
                    CARD_COLUMNS, column
                ),
                params![value],
                row_to_card,
            )
            .optional()?;
        Ok(card)
    }
}

impl CardCatalog for SqliteCardStore {
    fn get(&self, id: &str) -> Result<Option<Card>, StoreError> {
        self.get_where("id", id)
    }

    fn get_by_name(&self, name: &str) -> Result<Option<Card>, StoreError> {
        self.get_where("name", name)
    }

    fn search(&self, query: &CardSearchQuery) -> Result<CardPage, StoreError> {
        let conn = self.read()?;
        search::search(&conn, query, self.limits)
    }

    fn identify(&self, name: &str, limit: usize) -> Result<IdentifyResult, StoreError> {
        let conn = self.read()?;
        let limit = match limit {
            0 => self.limits.identify_limit as usize,
            n => n.min(self.limits.max_limit as usize),
        };
        search::identify(&conn, name, limit)
    }

    fn stats(&self) -> Result<CatalogStats, StoreError> {
        let conn = self.read()?;

        let (total_cards, distinct_oracle_ids, distinct_sets, last_updated_at) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT oracle_id), COUNT(DISTINCT set_code), MAX(updated_at)
             FROM cards",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )?;

        Ok(CatalogStats {
            total_cards: total_cards as u64,
            distinct_oracle_ids: distinct_oracle_ids as u64,
            distinct_sets: distinct_sets as u64,
            last_updated_at,
            search_index_available: index::available(&conn)?,
        })
    }
}

fn open_reader(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

impl CatalogWriter for SqliteCardStore {
    fn write_batch(&self, cards: &[Card]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(UPSERT_CARD)?;
            for card in cards {
                stmt.execute(named_params! {
                    ":id": card.id,
                    ":oracle_id": card.oracle_id,
                    ":name": card.name,
                    ":mana_cost": card.mana_cost,
                    ":cmc": card.cmc,
                    ":oracle_text": card.oracle_text,
                    ":types": card.types,
                    ":subtypes": card.subtypes,
                    ":supertypes": card.supertypes,
                    ":type_line": card.type_line,
                    ":colors": card.colors,
                    ":color_identity": card.color_identity,
                    ":set_code": card.set_code,
                    ":set_name": card.set_name,
                    ":collector_number": card.collector_number,
                    ":rarity": card.rarity,
                    ":image_uri": card.image_uri,
                    ":image_uri_small": card.image_uri_small,
                    ":multiverse_id": card.multiverse_id,
                    ":mtgo_id": card.mtgo_id,
                    ":price_card_kingdom": card.price_card_kingdom,
                    ":price_tcg_player": card.price_tcg_player,
                    ":price_star_city": card.price_star_city,
                    ":price_card_hoarder": card.price_card_hoarder,
                    ":price_card_market": card.price_card_market,
                    ":legalities": card.legalities,
                    ":power": card.power,
                    ":toughness": card.toughness,
                    ":loyalty": card.loyalty,
                    ":keywords": card.keywords,
                    ":released_at": card.released_at,
                    ":updated_at": card.updated_at,
                })?;
            }
        }

        tx.commit()?;
        Ok(cards.len())
    }

    fn create_search_index(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        index::create(&conn)?;
        Ok(())
    }

    fn rebuild_search_index(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        index::rebuild(&conn)?;
        Ok(())
    }

    fn index_card(&self, id: &str) -> Result<(), IndexUnavailable> {
        let conn = self
            .lock()
            .map_err(|e| IndexUnavailable(e.to_string()))?;
        index::insert_row(&conn, id)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
