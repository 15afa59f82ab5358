//! Draft filter injection for governed billing tables.
//!
//! SAP Note 2768887 introduced draft billing documents in `VBRK`/`VBRP`.
//! A `SELECT *` that does not restrict `DRAFT` reads those drafts as if
//! they were posted, so every such read gets `<TABLE>-DRAFT = SPACE`.

use regex::Regex;
use std::sync::LazyLock;

use crate::locator::LocatedStatement;

/// Tables whose reads must exclude draft rows.
pub const GOVERNED_TABLES: [&str; 2] = ["VBRK", "VBRP"];

/// Per-table detector for an existing `<TABLE>-DRAFT =` condition.
static DRAFT_FILTERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    GOVERNED_TABLES
        .iter()
        .map(|table| {
            let pattern = format!(r#"(?i){}-DRAFT\s*=\s*['"]? ?['"]?"#, regex::escape(table));
            (*table, Regex::new(&pattern).expect("draft filter pattern is valid"))
        })
        .collect()
});

static WHERE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("WHERE pattern is valid"));

static INTO_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bINTO\b").expect("INTO pattern is valid"));

/// Whether `table` is one of [`GOVERNED_TABLES`], ignoring case.
pub fn is_governed(table: &str) -> bool {
    GOVERNED_TABLES.iter().any(|t| t.eq_ignore_ascii_case(table))
}

fn draft_filter(table_up: &str) -> Option<&'static Regex> {
    DRAFT_FILTERS
        .iter()
        .find(|(table, _)| *table == table_up)
        .map(|(_, re)| re)
}

/// Return `stmt` with `<TABLE>-DRAFT = SPACE` added, or unchanged when the
/// table is not governed or the statement already filters on `DRAFT`.
///
/// The condition becomes the first conjunct of an existing `WHERE`, or a
/// new `WHERE` right before `INTO`. Statements with neither keyword get the
/// clause appended before the period.
///
/// # Example
///
/// ```
/// use draftfix::injector::ensure_draft_filter;
///
/// let out = ensure_draft_filter("SELECT * FROM vbrp WHERE posnr = '10' INTO TABLE lt.", "vbrp");
/// assert_eq!(out, "SELECT * FROM vbrp WHERE VBRP-DRAFT = SPACE AND posnr = '10' INTO TABLE lt.");
/// ```
pub fn ensure_draft_filter(stmt: &str, table: &str) -> String {
    let table_up = table.to_uppercase();
    let Some(existing) = draft_filter(&table_up) else {
        return stmt.to_string();
    };
    if existing.is_match(stmt) {
        return stmt.to_string();
    }

    if let Some(m) = WHERE_KEYWORD.find(stmt) {
        let (head, rest) = stmt.split_at(m.end());
        return format!("{head} {table_up}-DRAFT = SPACE AND{rest}");
    }

    if let Some(m) = INTO_KEYWORD.find(stmt) {
        let (head, rest) = stmt.split_at(m.start());
        // Reuse the whitespace already in front of INTO.
        let lead = if head.ends_with(char::is_whitespace) { "" } else { " " };
        return format!("{head}{lead}WHERE {table_up}-DRAFT = SPACE {rest}");
    }

    // The locator always captures an INTO clause; this covers direct callers.
    format!(
        "{} WHERE {table_up}-DRAFT = SPACE.",
        stmt.trim_end_matches('.')
    )
}

/// Collapse every whitespace run (newlines included) to a single space and
/// trim both ends.
pub fn normalize_whitespace(stmt: &str) -> String {
    stmt.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Suggested replacement for a located statement, if it needs one.
///
/// `None` for non-governed tables and for statements that already carry
/// the filter. With `normalize` the suggestion is flattened to one line.
pub fn build_replacement(statement: &LocatedStatement<'_>, normalize: bool) -> Option<String> {
    if !is_governed(statement.table) {
        return None;
    }

    let rewritten = ensure_draft_filter(statement.text, statement.table);
    if rewritten == statement.text {
        return None;
    }

    if normalize {
        Some(normalize_whitespace(&rewritten))
    } else {
        Some(rewritten)
    }
}
