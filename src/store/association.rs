//! Codec for the `trp_paper` association blob.
//!
//! The blob is a comma-joined list of double-quoted paper ids:
//! `"WBPaper00000001","WBPaper00000002"`. Ids are written in sorted order so
//! the same set always produces the same blob.

use std::collections::BTreeSet;

use thiserror::Error;

/// A stored blob that does not follow the quoted-CSV layout.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed paper association at element {index}: {element:?}")]
pub struct MalformedAssociation {
    pub index: usize,
    pub element: String,
}

/// Serialize paper ids into the stored blob.
pub fn format_papers<I, S>(paper_ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paper_ids
        .into_iter()
        .map(|id| format!("\"{}\"", id.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a stored blob. An empty or blank blob is the empty set.
pub fn parse_papers(blob: &str) -> Result<BTreeSet<String>, MalformedAssociation> {
    if blob.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    blob.split(',')
        .enumerate()
        .map(|(index, element)| {
            let trimmed = element.trim();
            trimmed
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .filter(|inner| !inner.is_empty() && !inner.contains('"'))
                .map(str::to_string)
                .ok_or_else(|| MalformedAssociation {
                    index,
                    element: element.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_paper() {
        assert_eq!(format_papers(["WBPaper00000001"]), "\"WBPaper00000001\"");
    }

    #[test]
    fn set_is_written_in_order() {
        let set: BTreeSet<&str> = ["WBPaper2", "WBPaper1"].into_iter().collect();
        assert_eq!(format_papers(set), "\"WBPaper1\",\"WBPaper2\"");
    }

    #[test]
    fn parses_written_form() {
        let parsed = parse_papers("\"WBPaper1\",\"WBPaper2\"").unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.contains("WBPaper2"));
    }

    #[test]
    fn tolerates_whitespace_between_elements() {
        let parsed = parse_papers(" \"WBPaper1\" , \"WBPaper2\"\n").unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn blank_is_empty() {
        assert!(parse_papers("").unwrap().is_empty());
        assert!(parse_papers("   ").unwrap().is_empty());
    }

    #[test]
    fn rejects_unquoted_and_broken_elements() {
        assert!(parse_papers("WBPaper1").is_err());
        assert!(parse_papers("\"WBPaper1\",WBPaper2").is_err());
        assert!(parse_papers("\"WBPa\"per1\"").is_err());
        assert!(parse_papers("\"\"").is_err());
        let err = parse_papers("\"WBPaper1\",,\"WBPaper2\"").unwrap_err();
        assert_eq!(err.index, 1);
    }
}
