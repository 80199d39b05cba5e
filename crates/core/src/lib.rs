pub mod card;
pub mod config;
pub mod import;
pub mod lookup;
pub mod metrics;
pub mod scryfall;
pub mod store;
pub mod testing;

pub use card::{normalize, parse_type_line, Card, ExternalCard, Normalized, SkipReason};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
};
pub use import::{ImportError, ImportJob, ImportPipeline, ImportReport};
pub use lookup::{CardLookup, LookupError};
pub use scryfall::{CardSource, NameMatch, ScryfallClient, ScryfallError};
pub use store::{
    CardCatalog, CardPage, CardSearchQuery, CatalogStats, CatalogWriter, IdentifyResult,
    SearchTier, SqliteCardStore, StoreError,
};
