//! Tiered query engine.
//!
//! Text search tries the full-text index first and falls back to a substring
//! scan when the index is missing or broken. Identification adds an exact
//! name tier in front and also falls through when the index finds nothing.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use super::match_expr::fts_match_expression;
use super::schema::{row_to_card, CARD_COLUMNS};
use super::{
    CardPage, CardSearchQuery, IdentifyResult, IndexUnavailable, SearchFilters, SearchTier,
    StoreError,
};
use crate::card::Card;
use crate::metrics::{INDEX_FALLBACKS, SEARCH_QUERIES};

const FTS_JOIN: &str = "FROM cards_fts JOIN cards c ON c.rowid = cards_fts.rowid";

/// Page size bounds applied to every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
    pub identify_limit: u32,
}

/// SQL conditions plus their positional parameters.
#[derive(Debug, Default)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    fn from_filters(filters: &SearchFilters) -> Result<Self, StoreError> {
        let mut conditions = Conditions::default();

        if let Some(set) = non_blank(&filters.set) {
            conditions.push("c.set_code = ?", [Value::Text(set.to_string())]);
        }
        if let Some(rarity) = non_blank(&filters.rarity) {
            conditions.push("c.rarity = ?", [Value::Text(rarity.to_string())]);
        }
        if let Some(type_name) = non_blank(&filters.type_contains) {
            conditions.push("c.types LIKE ? ESCAPE '\\'", [like_pattern(type_name)]);
        }
        for color in filters.colors.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            conditions.push("c.colors LIKE ? ESCAPE '\\'", [like_pattern(color)]);
        }
        if let Some(format) = non_blank(&filters.format) {
            validate_format(format)?;
            conditions.push(
                "json_extract(c.legalities, ?) = 'legal'",
                [Value::Text(format!("$.{}", format))],
            );
        }

        Ok(conditions)
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }
}

/// Format names are interpolated into a JSON path.
fn validate_format(format: &str) -> Result<(), StoreError> {
    let valid = format
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!(
            "unknown format name '{}'",
            format
        )))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%text%` with LIKE wildcards in `text` escaped.
fn like_pattern(text: &str) -> Value {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Value::Text(escaped)
}

fn query_cards(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Card>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), row_to_card)?;
    rows.collect()
}

fn query_count(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(sql, params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(count as u64)
}

/// Resolved paging for one query.
struct Paging {
    page: u32,
    limit: u32,
    offset: u64,
    order_by: String,
}

impl Paging {
    fn new(query: &CardSearchQuery, limits: PageLimits) -> Self {
        let page = query.page.max(1);
        let limit = query
            .limit
            .unwrap_or(limits.default_limit)
            .clamp(1, limits.max_limit.max(1));
        Self {
            page,
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
            order_by: format!(
                "{} {}, c.name ASC, c.id ASC",
                query.sort.column(),
                query.order.keyword()
            ),
        }
    }

    fn params(&self) -> [Value; 2] {
        [
            Value::Integer(i64::from(self.limit)),
            Value::Integer(self.offset as i64),
        ]
    }

    fn into_page(self, cards: Vec<Card>, total: u64, tier: SearchTier) -> CardPage {
        CardPage {
            cards,
            total,
            page: self.page,
            total_pages: total.div_ceil(u64::from(self.limit)),
            tier,
        }
    }
}

/// Run a paged search.
pub(crate) fn search(
    conn: &Connection,
    query: &CardSearchQuery,
    limits: PageLimits,
) -> Result<CardPage, StoreError> {
    let filters = Conditions::from_filters(&query.filters)?;
    let paging = Paging::new(query, limits);

    let Some(text) = non_blank(&query.text) else {
        // Browse: filters only
        let page = substring_page(conn, None, filters, paging)?;
        record("search", page.tier);
        return Ok(page);
    };

    let Some(expr) = fts_match_expression(text) else {
        debug!("Search text '{}' has no searchable terms", text);
        record("search", SearchTier::None);
        return Ok(CardPage::empty(paging.page));
    };

    let page = match indexed_page(conn, &expr, &filters, &paging) {
        Ok((cards, total)) => paging.into_page(cards, total, SearchTier::Indexed),
        Err(e) => {
            debug!("Index search failed, falling back to substring scan: {}", e);
            INDEX_FALLBACKS.with_label_values(&["search"]).inc();
            substring_page(conn, Some(text), filters, paging)?
        }
    };

    record("search", page.tier);
    Ok(page)
}

fn indexed_page(
    conn: &Connection,
    expr: &str,
    filters: &Conditions,
    paging: &Paging,
) -> Result<(Vec<Card>, u64), IndexUnavailable> {
    let mut where_sql = "cards_fts MATCH ?".to_string();
    if !filters.clauses.is_empty() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&filters.where_sql());
    }

    let mut params = vec![Value::Text(expr.to_string())];
    params.extend(filters.params.iter().cloned());

    let total = query_count(
        conn,
        &format!("SELECT COUNT(*) {} WHERE {}", FTS_JOIN, where_sql),
        &params,
    )?;

    params.extend(paging.params());
    let cards = query_cards(
        conn,
        &format!(
            "SELECT {} {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            CARD_COLUMNS, FTS_JOIN, where_sql, paging.order_by
        ),
        &params,
    )?;

    Ok((cards, total))
}

fn substring_page(
    conn: &Connection,
    text: Option<&str>,
    filters: Conditions,
    paging: Paging,
) -> Result<CardPage, StoreError> {
    let mut conditions = Conditions::default();
    if let Some(text) = text {
        let pattern = like_pattern(text);
        conditions.push(
            "(c.name LIKE ? ESCAPE '\\' OR c.type_line LIKE ? ESCAPE '\\' \
             OR c.oracle_text LIKE ? ESCAPE '\\')",
            [pattern.clone(), pattern.clone(), pattern],
        );
    }
    conditions.clauses.extend(filters.clauses);
    conditions.params.extend(filters.params);

    let where_sql = conditions.where_sql();
    let mut params = conditions.params;

    let total = query_count(
        conn,
        &format!("SELECT COUNT(*) FROM cards c WHERE {}", where_sql),
        &params,
    )?;

    params.extend(paging.params());
    let cards = query_cards(
        conn,
        &format!(
            "SELECT {} FROM cards c WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            CARD_COLUMNS, where_sql, paging.order_by
        ),
        &params,
    )?;

    let tier = if text.is_some() {
        SearchTier::Substring
    } else {
        SearchTier::None
    };
    Ok(paging.into_page(cards, total, tier))
}

/// Find candidate printings for a recognized name.
pub(crate) fn identify(
    conn: &Connection,
    name: &str,
    limit: usize,
) -> Result<IdentifyResult, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        record("identify", SearchTier::None);
        return Ok(IdentifyResult {
            cards: Vec::new(),
            tier: SearchTier::None,
        });
    }
    let limit = Value::Integer(limit.max(1) as i64);

    let exact = query_cards(
        conn,
        &format!(
            "SELECT {} FROM cards c WHERE c.name = ? \
             ORDER BY c.released_at DESC, c.id ASC LIMIT ?",
            CARD_COLUMNS
        ),
        &[Value::Text(name.to_string()), limit.clone()],
    )?;
    if !exact.is_empty() {
        return Ok(identified(name, exact, SearchTier::Exact));
    }

    // Case-insensitive exact names sort first, then alphabetical
    let order_by = "CASE WHEN c.name = ? COLLATE NOCASE THEN 0 ELSE 1 END, c.name ASC, c.id ASC";

    let Some(expr) = fts_match_expression(name) else {
        debug!("Identify '{}' has no searchable terms", name);
        return Ok(identified(name, Vec::new(), SearchTier::None));
    };

    let indexed: Result<Vec<Card>, IndexUnavailable> = query_cards(
        conn,
        &format!(
            "SELECT {} {} WHERE cards_fts MATCH ? ORDER BY {} LIMIT ?",
            CARD_COLUMNS, FTS_JOIN, order_by
        ),
        &[
            Value::Text(expr),
            Value::Text(name.to_string()),
            limit.clone(),
        ],
    )
    .map_err(IndexUnavailable::from);

    match indexed {
        Ok(cards) if !cards.is_empty() => {
            return Ok(identified(name, cards, SearchTier::Indexed));
        }
        Ok(_) => debug!("Index found no match for '{}'", name),
        Err(e) => {
            debug!("Index identify failed, falling back to substring scan: {}", e);
            INDEX_FALLBACKS.with_label_values(&["identify"]).inc();
        }
    }

    let cards = query_cards(
        conn,
        &format!(
            "SELECT {} FROM cards c WHERE c.name LIKE ? ESCAPE '\\' ORDER BY {} LIMIT ?",
            CARD_COLUMNS, order_by
        ),
        &[like_pattern(name), Value::Text(name.to_string()), limit],
    )?;
    Ok(identified(name, cards, SearchTier::Substring))
}

fn identified(name: &str, cards: Vec<Card>, tier: SearchTier) -> IdentifyResult {
    let tier = if cards.is_empty() {
        SearchTier::None
    } else {
        tier
    };
    debug!(
        "Identify '{}': {} candidate(s) via {} tier",
        name,
        cards.len(),
        tier.label()
    );
    record("identify", tier);
    IdentifyResult { cards, tier }
}

fn record(consumer: &str, tier: SearchTier) {
    SEARCH_QUERIES
        .with_label_values(&[consumer, tier.label()])
        .inc();
}
