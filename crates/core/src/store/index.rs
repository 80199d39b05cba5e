//! Full-text index maintenance.

use rusqlite::{params, Connection};

use super::schema::{CREATE_SEARCH_INDEX, INDEX_CARD, REBUILD_SEARCH_INDEX};
use super::IndexUnavailable;

pub(crate) fn create(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_SEARCH_INDEX)
}

pub(crate) fn rebuild(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(REBUILD_SEARCH_INDEX, [])?;
    Ok(())
}

pub(crate) fn available(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'cards_fts')",
        [],
        |row| row.get(0),
    )
}

/// Index a single row that is not yet in the index.
pub(crate) fn insert_row(conn: &Connection, id: &str) -> Result<(), IndexUnavailable> {
    if !available(conn)? {
        return Err(IndexUnavailable("cards_fts does not exist".to_string()));
    }
    conn.execute(INDEX_CARD, params![id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::CREATE_TABLES;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_TABLES).unwrap();
        conn
    }

    fn insert(conn: &Connection, id: &str, name: &str) {
        conn.execute(
            "INSERT INTO cards (id, name, updated_at) VALUES (?1, ?2, '2024-01-01T00:00:00Z')",
            params![id, name],
        )
        .unwrap();
    }

    fn matches(conn: &Connection, expr: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM cards_fts WHERE cards_fts MATCH ?1",
            params![expr],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_available_tracks_creation() {
        let conn = conn();
        assert!(!available(&conn).unwrap());
        create(&conn).unwrap();
        assert!(available(&conn).unwrap());
    }

    #[test]
    fn test_create_then_rebuild_indexes_existing_rows() {
        let conn = conn();
        insert(&conn, "a", "Lightning Bolt");
        insert(&conn, "b", "Counterspell");

        create(&conn).unwrap();
        assert_eq!(matches(&conn, "\"bolt\"*"), 0);

        rebuild(&conn).unwrap();
        assert_eq!(matches(&conn, "\"bolt\"*"), 1);
        assert_eq!(matches(&conn, "\"counter\"*"), 1);
    }

    #[test]
    fn test_create_is_repeatable() {
        let conn = conn();
        insert(&conn, "a", "Lightning Bolt");
        create(&conn).unwrap();
        rebuild(&conn).unwrap();
        create(&conn).unwrap();
        rebuild(&conn).unwrap();
        assert_eq!(matches(&conn, "\"lightning\"*"), 1);
    }

    #[test]
    fn test_insert_row() {
        let conn = conn();
        create(&conn).unwrap();
        insert(&conn, "a", "Llanowar Elves");

        insert_row(&conn, "a").unwrap();
        assert_eq!(matches(&conn, "\"llanowar\"*"), 1);
    }

    #[test]
    fn test_insert_row_without_index() {
        let conn = conn();
        insert(&conn, "a", "Llanowar Elves");
        assert!(insert_row(&conn, "a").is_err());
    }
}
