//! Catalog table definitions.

use rusqlite::Row;

use crate::card::Card;

/// Column list shared by every SELECT that builds a [`crate::card::Card`].
///
/// Order must match [`row_to_card`].
pub(crate) const CARD_COLUMNS: &str = "c.id, c.oracle_id, c.name, c.mana_cost, c.cmc, \
     c.oracle_text, c.types, c.subtypes, c.supertypes, c.type_line, c.colors, \
     c.color_identity, c.set_code, c.set_name, c.collector_number, c.rarity, \
     c.image_uri, c.image_uri_small, c.multiverse_id, c.mtgo_id, \
     c.price_card_kingdom, c.price_tcg_player, c.price_star_city, \
     c.price_card_hoarder, c.price_card_market, c.legalities, c.power, \
     c.toughness, c.loyalty, c.keywords, c.released_at, c.updated_at";

/// Build a card from a row selected with [`CARD_COLUMNS`].
pub(crate) fn row_to_card(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        oracle_id: row.get(1)?,
        name: row.get(2)?,
        mana_cost: row.get(3)?,
        cmc: row.get(4)?,
        oracle_text: row.get(5)?,
        types: row.get(6)?,
        subtypes: row.get(7)?,
        supertypes: row.get(8)?,
        type_line: row.get(9)?,
        colors: row.get(10)?,
        color_identity: row.get(11)?,
        set_code: row.get(12)?,
        set_name: row.get(13)?,
        collector_number: row.get(14)?,
        rarity: row.get(15)?,
        image_uri: row.get(16)?,
        image_uri_small: row.get(17)?,
        multiverse_id: row.get(18)?,
        mtgo_id: row.get(19)?,
        price_card_kingdom: row.get(20)?,
        price_tcg_player: row.get(21)?,
        price_star_city: row.get(22)?,
        price_card_hoarder: row.get(23)?,
        price_card_market: row.get(24)?,
        legalities: row.get(25)?,
        power: row.get(26)?,
        toughness: row.get(27)?,
        loyalty: row.get(28)?,
        keywords: row.get(29)?,
        released_at: row.get(30)?,
        updated_at: row.get(31)?,
    })
}

pub(crate) const CREATE_TABLES: &str = r#"
    -- One row per printing; id is the external printing identifier
    CREATE TABLE IF NOT EXISTS cards (
        id TEXT PRIMARY KEY,
        oracle_id TEXT,
        name TEXT NOT NULL,
        mana_cost TEXT,
        cmc REAL,
        oracle_text TEXT,
        types TEXT NOT NULL DEFAULT '',
        subtypes TEXT NOT NULL DEFAULT '',
        supertypes TEXT NOT NULL DEFAULT '',
        type_line TEXT,
        colors TEXT,
        color_identity TEXT,
        set_code TEXT,
        set_name TEXT,
        collector_number TEXT,
        rarity TEXT,
        image_uri TEXT,
        image_uri_small TEXT,
        multiverse_id INTEGER,
        mtgo_id INTEGER,
        price_card_kingdom REAL,
        price_tcg_player REAL,
        price_star_city REAL,
        price_card_hoarder REAL,
        price_card_market REAL,
        legalities TEXT,
        power TEXT,
        toughness TEXT,
        loyalty TEXT,
        keywords TEXT,
        released_at TEXT,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_cards_name ON cards(name);
    CREATE INDEX IF NOT EXISTS idx_cards_oracle_id ON cards(oracle_id);
    CREATE INDEX IF NOT EXISTS idx_cards_set_code ON cards(set_code);
    CREATE INDEX IF NOT EXISTS idx_cards_colors ON cards(colors);
    CREATE INDEX IF NOT EXISTS idx_cards_type_line ON cards(type_line);
    CREATE INDEX IF NOT EXISTS idx_cards_cmc ON cards(cmc);
    CREATE INDEX IF NOT EXISTS idx_cards_rarity ON cards(rarity);
"#;

/// Full overwrite of an existing printing; the row keeps its rowid.
pub(crate) const UPSERT_CARD: &str = r#"
    INSERT INTO cards (
        id, oracle_id, name, mana_cost, cmc, oracle_text, types, subtypes,
        supertypes, type_line, colors, color_identity, set_code, set_name,
        collector_number, rarity, image_uri, image_uri_small, multiverse_id,
        mtgo_id, price_card_kingdom, price_tcg_player, price_star_city,
        price_card_hoarder, price_card_market, legalities, power, toughness,
        loyalty, keywords, released_at, updated_at
    ) VALUES (
        :id, :oracle_id, :name, :mana_cost, :cmc, :oracle_text, :types, :subtypes,
        :supertypes, :type_line, :colors, :color_identity, :set_code, :set_name,
        :collector_number, :rarity, :image_uri, :image_uri_small, :multiverse_id,
        :mtgo_id, :price_card_kingdom, :price_tcg_player, :price_star_city,
        :price_card_hoarder, :price_card_market, :legalities, :power, :toughness,
        :loyalty, :keywords, :released_at, :updated_at
    )
    ON CONFLICT(id) DO UPDATE SET
        oracle_id = excluded.oracle_id,
        name = excluded.name,
        mana_cost = excluded.mana_cost,
        cmc = excluded.cmc,
        oracle_text = excluded.oracle_text,
        types = excluded.types,
        subtypes = excluded.subtypes,
        supertypes = excluded.supertypes,
        type_line = excluded.type_line,
        colors = excluded.colors,
        color_identity = excluded.color_identity,
        set_code = excluded.set_code,
        set_name = excluded.set_name,
        collector_number = excluded.collector_number,
        rarity = excluded.rarity,
        image_uri = excluded.image_uri,
        image_uri_small = excluded.image_uri_small,
        multiverse_id = excluded.multiverse_id,
        mtgo_id = excluded.mtgo_id,
        price_card_kingdom = excluded.price_card_kingdom,
        price_tcg_player = excluded.price_tcg_player,
        price_star_city = excluded.price_star_city,
        price_card_hoarder = excluded.price_card_hoarder,
        price_card_market = excluded.price_card_market,
        legalities = excluded.legalities,
        power = excluded.power,
        toughness = excluded.toughness,
        loyalty = excluded.loyalty,
        keywords = excluded.keywords,
        released_at = excluded.released_at,
        updated_at = excluded.updated_at
"#;

/// Drop and recreate the external-content full-text index.
pub(crate) const CREATE_SEARCH_INDEX: &str = r#"
    DROP TABLE IF EXISTS cards_fts;
    CREATE VIRTUAL TABLE cards_fts USING fts5(
        name,
        types,
        subtypes,
        supertypes,
        oracle_text,
        content='cards',
        content_rowid='rowid'
    );
"#;

pub(crate) const REBUILD_SEARCH_INDEX: &str =
    "INSERT INTO cards_fts(cards_fts) VALUES('rebuild')";

/// Index one stored row by printing id.
pub(crate) const INDEX_CARD: &str = r#"
    INSERT INTO cards_fts(rowid, name, types, subtypes, supertypes, oracle_text)
    SELECT rowid, name, types, subtypes, supertypes, oracle_text
    FROM cards WHERE id = ?1
"#;
