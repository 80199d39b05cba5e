//! Free text to FTS5 match expression.

/// Build a prefix-match expression from free text.
///
/// Every character that is neither a word character (Unicode alphanumeric
/// or `_`) nor whitespace is removed. Each remaining token becomes a quoted
/// prefix query (`"bolt"*`), so FTS5 operators like `AND` or `NEAR` in user
/// input are matched as plain words. Returns `None` when nothing is left.
pub fn fts_match_expression(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let terms: Vec<String> = cleaned
        .split_whitespace()
        .map(|token| format!("\"{}\"*", token))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
