//! Dash canonicalization for extracted sentence text.
//!
//! PDF-to-text conversion frequently emits typographic dashes inside
//! identifiers (`abcIs12–3`, `unc‐119`). Only two code points are folded;
//! everything else is left untouched.

/// U+2013 EN DASH.
const EN_DASH: char = '\u{2013}';
/// U+2010 HYPHEN.
const UNICODE_HYPHEN: char = '\u{2010}';

/// Replace en-dash and Unicode hyphen with an ASCII hyphen.
pub fn normalize_dashes(segment: &str) -> String {
    segment.replace([EN_DASH, UNICODE_HYPHEN], "-")
}

/// Normalize every segment, preserving order.
pub fn normalize_segments<I, S>(segments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|s| normalize_dashes(s.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_both_dash_variants() {
        assert_eq!(normalize_dashes("a\u{2013}b\u{2010}c"), "a-b-c");
    }

    #[test]
    fn leaves_other_dashes_alone() {
        // em-dash and minus sign are not part of the substitution set
        let s = "x\u{2014}y\u{2212}z";
        assert_eq!(normalize_dashes(s), s);
    }

    #[test]
    fn preserves_order_and_count() {
        let out = normalize_segments(["one\u{2013}1", "two", "three\u{2010}3"]);
        assert_eq!(out, vec!["one-1", "two", "three-3"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = normalize_segments(Vec::<String>::new());
        assert!(out.is_empty());
    }
}
