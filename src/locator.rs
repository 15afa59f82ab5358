//! Statement locator for `SELECT *` reads in ABAP source.
//!
//! Matching is lexical: a single case-insensitive pattern with lazy middle
//! and tail regions, dot matching newlines. A period outside a quoted
//! literal ends the statement, so the regions before and after `INTO` may
//! only carry one inside `'...'` or `` `...` ``.
//!
//! ```text
//! SELECT SINGLE * FROM vbrk WHERE vbeln = lv_vbeln INTO ls_vbrk.
//! ─┬──── ─┬──── ┬ ─────┬─── ──────────┬────────── ─────┬─────┬
//!  │      │     │      │              │                │     │
//!  │      │     │      │              │                │     └── Terminator (first period outside a literal)
//!  │      │     │      │              │                └── Destination (INTO TABLE / INTO)
//!  │      │     │      │              └── Middle (lazy, may span lines)
//!  │      │     │      └── Table
//!  │      │     └── Star
//!  │      └── Optional SINGLE
//!  └── Keyword
//! ```

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

use crate::model::TargetType;

static SELECT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?isx)
        SELECT\s+(?:SINGLE\s+)?\*\s+FROM\s+(?P<table>\w+)
        (?P<middle>(?:'[^']*'|`[^`]*`|[^.'`])*?)
        (?:INTO\s+TABLE\s+(?P<into_tab>\w+)|INTO\s+(?P<into_wa>\w+))
        (?P<tail>(?:'[^']*'|`[^`]*`|[^.'`])*?)
        \.",
    )
    .expect("SELECT * pattern is valid")
});

/// A `SELECT *` statement found in a unit's source.
///
/// Borrows from the scanned text; `span` is a byte range into it and
/// `text` is exactly `source[span]`, terminating period included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedStatement<'a> {
    pub text: &'a str,
    pub table: &'a str,
    pub target_type: TargetType,
    pub target_name: &'a str,
    pub span: Range<usize>,
}

impl<'a> LocatedStatement<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let full = caps.get(0)?;
        let table = caps.name("table")?;
        let (target_type, target) = match caps.name("into_tab") {
            Some(m) => (TargetType::Itab, m),
            None => (TargetType::Wa, caps.name("into_wa")?),
        };

        Some(Self {
            text: full.as_str(),
            table: table.as_str(),
            target_type,
            target_name: target.as_str(),
            span: full.range(),
        })
    }
}

/// Converts byte spans of one source into character spans.
///
/// Spans must be fed in ascending, non-overlapping order (the order
/// [`find_selects`] yields them); only the gap since the previous span and
/// the span itself are counted.
#[derive(Debug, Clone)]
pub struct CharCursor<'a> {
    source: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            byte: 0,
            chars: 0,
        }
    }

    /// Character range of the byte range `span`.
    ///
    /// # Panics
    ///
    /// Panics if `span` starts before the end of the previous span.
    pub fn char_span(&mut self, span: Range<usize>) -> Range<usize> {
        assert!(span.start >= self.byte, "spans must be fed in order");
        let start = self.chars + self.source[self.byte..span.start].chars().count();
        let end = start + self.source[span.clone()].chars().count();
        self.byte = span.end;
        self.chars = end;
        start..end
    }
}

/// Find every `SELECT *` statement in `text`, left to right.
///
/// Matches never overlap. A statement without an `INTO` clause before its
/// terminating period is not matched at all.
pub fn find_selects(text: &str) -> impl Iterator<Item = LocatedStatement<'_>> {
    SELECT_STAR
        .captures_iter(text)
        .filter_map(|caps| LocatedStatement::from_captures(&caps))
}
