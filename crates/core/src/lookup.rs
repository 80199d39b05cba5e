//! Write-through card lookup.
//!
//! Reads the local catalog first. On a miss the card is fetched from the
//! external source, normalized, stored, added to the search index and
//! returned, so the next lookup is served locally.

use std::slice;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::card::{normalize, Card, ExternalCard, Normalized, SkipReason};
use crate::metrics::LOOKUPS;
use crate::scryfall::{CardSource, NameMatch, ScryfallError};
use crate::store::{CardCatalog, CatalogWriter, StoreError};

/// Errors from a write-through lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Neither the catalog nor the source knows the card.
    #[error("card not found: {0}")]
    NotFound(String),

    /// The source returned a record the catalog never stores.
    #[error("card is not catalogable: {0}")]
    NotCatalogable(SkipReason),

    #[error("source error: {0}")]
    Source(ScryfallError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ScryfallError> for LookupError {
    fn from(e: ScryfallError) -> Self {
        match e {
            ScryfallError::NotFound(key) => LookupError::NotFound(key),
            other => LookupError::Source(other),
        }
    }
}

/// Local-first card lookup with write-through cache fill.
pub struct CardLookup {
    catalog: Arc<dyn CardCatalog>,
    writer: Arc<dyn CatalogWriter>,
    source: Arc<dyn CardSource>,
}

impl CardLookup {
    /// Create a lookup over `store`, filling misses from `source`.
    pub fn new<S>(store: Arc<S>, source: Arc<dyn CardSource>) -> Self
    where
        S: CardCatalog + CatalogWriter + 'static,
    {
        Self {
            catalog: store.clone(),
            writer: store,
            source,
        }
    }

    /// Get a printing by id, fetching and storing it on a local miss.
    pub async fn get_or_fetch(&self, id: &str) -> Result<Card, LookupError> {
        if let Some(card) = self.catalog.get(id)? {
            LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(card);
        }

        debug!("Card {} not in catalog, fetching from source", id);
        let external = self.fetch(self.source.card_by_id(id).await)?;
        self.store_fetched(&external)
    }

    /// Get a printing by name, fetching and storing it on a local miss.
    ///
    /// The local check is exact; `mode` applies to the external lookup.
    pub async fn get_or_fetch_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<Card, LookupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LookupError::NotFound(String::new()));
        }

        if let Some(card) = self.catalog.get_by_name(name)? {
            LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(card);
        }

        debug!("Card '{}' not in catalog, fetching from source", name);
        let external = self.fetch(self.source.card_by_name(name, mode).await)?;

        // A fuzzy match can resolve to a printing that is already stored
        if let Some(card) = self.catalog.get(&external.id)? {
            LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(card);
        }

        self.store_fetched(&external)
    }

    /// Name suggestions from the source; empty on any failure.
    pub async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.source.autocomplete(prefix).await
    }

    fn fetch(
        &self,
        result: Result<ExternalCard, ScryfallError>,
    ) -> Result<ExternalCard, LookupError> {
        result.map_err(|e| {
            let e = LookupError::from(e);
            let label = match e {
                LookupError::NotFound(_) => "not_found",
                _ => "error",
            };
            LOOKUPS.with_label_values(&[label]).inc();
            e
        })
    }

    fn store_fetched(&self, external: &ExternalCard) -> Result<Card, LookupError> {
        let card = match normalize(external, Utc::now()) {
            Normalized::Row(card) => *card,
            Normalized::Skip(reason) => {
                debug!("Fetched card {} not stored: {}", external.id, reason);
                LOOKUPS.with_label_values(&["not_catalogable"]).inc();
                return Err(LookupError::NotCatalogable(reason));
            }
        };

        self.writer.write_batch(slice::from_ref(&card))?;

        if let Err(e) = self.writer.index_card(&card.id) {
            debug!("Card {} stored but not indexed: {}", card.id, e);
        }

        LOOKUPS.with_label_values(&["fetched"]).inc();
        info!("Stored card {} ({}) from source", card.id, card.name);
        Ok(card)
    }
}
