//! Span editor: splice replacements into the original text.

use std::ops::Range;

/// A replacement of one byte range of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(span: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Apply `edits` to `text` and return the edited text.
///
/// All spans refer to the unedited `text` and may be given in any order.
/// Edits are applied from the highest start offset down, so splicing one
/// never shifts the offsets of those still pending.
///
/// # Panics
///
/// Overlapping spans, or spans outside `text` or off a char boundary, are
/// programming errors and panic.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut out = text.to_string();
    let mut floor = text.len();
    for edit in ordered {
        assert!(
            edit.span.start <= edit.span.end && edit.span.end <= floor,
            "overlapping or out-of-range edit {:?}",
            edit.span
        );
        out.replace_range(edit.span.clone(), &edit.replacement);
        floor = edit.span.start;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edits_returns_input() {
        let text = "SELECT * FROM VBRK INTO TABLE LT.\nWRITE 'x'.";
        assert_eq!(apply_edits(text, &[]), text);
        assert_eq!(apply_edits("", &[]), "");
    }

    #[test]
    fn test_single_edit() {
        assert_eq!(apply_edits("abc def ghi", &[Edit::new(4..7, "XYZW")]), "abc XYZW ghi");
    }

    #[test]
    fn test_order_independent() {
        let text = "one two three";
        let forward = [Edit::new(0..3, "1"), Edit::new(8..13, "33333")];
        let backward = [Edit::new(8..13, "33333"), Edit::new(0..3, "1")];
        assert_eq!(apply_edits(text, &forward), "1 two 33333");
        assert_eq!(apply_edits(text, &backward), "1 two 33333");
    }

    #[test]
    fn test_growing_and_shrinking_edits() {
        let text = "aa|bb|cc";
        let edits = [Edit::new(0..2, "A"), Edit::new(3..5, "BBBBBB"), Edit::new(6..8, "")];
        assert_eq!(apply_edits(text, &edits), "A|BBBBBB|");
    }

    #[test]
    fn test_adjacent_edits() {
        assert_eq!(apply_edits("abcd", &[Edit::new(0..2, "X"), Edit::new(2..4, "Y")]), "XY");
    }

    #[test]
    fn test_insertion_at_empty_span() {
        assert_eq!(apply_edits("ab", &[Edit::new(1..1, "-")]), "a-b");
    }

    #[test]
    #[should_panic(expected = "overlapping")]
    fn test_overlapping_edits_panic() {
        apply_edits("abcdef", &[Edit::new(0..4, "x"), Edit::new(2..6, "y")]);
    }
}
