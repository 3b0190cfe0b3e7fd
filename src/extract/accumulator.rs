//! Per-run mention accumulation.
//!
//! The accumulator is threaded through the extraction loop and finished once
//! into an [`Extraction`], which reconciliation only reads. Nothing is written
//! to the store while papers are still being scanned.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::extract::MentionIndex;

/// Mutable per-run collector of mentions.
#[derive(Debug, Default)]
pub struct MentionAccumulator {
    known: MentionIndex,
    novel: MentionIndex,
    processed: Vec<String>,
    seen: BTreeSet<String>,
}

impl MentionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that curated `name` is mentioned in `paper_id`.
    pub fn record_known(&mut self, name: &str, paper_id: &str) {
        self.known
            .entry(name.to_string())
            .or_default()
            .insert(paper_id.to_string());
    }

    /// Record that novel token `token` (surface case) occurs in `paper_id`.
    pub fn record_novel(&mut self, token: &str, paper_id: &str) {
        self.novel
            .entry(token.to_string())
            .or_default()
            .insert(paper_id.to_string());
    }

    /// Mark a paper as processed. Repeated ids are kept once, first position wins.
    pub fn mark_processed(&mut self, paper_id: &str) {
        if self.seen.insert(paper_id.to_string()) {
            self.processed.push(paper_id.to_string());
        }
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Freeze the accumulated state.
    pub fn finish(self) -> Extraction {
        Extraction {
            known: self.known,
            novel: self.novel,
            processed: self.processed,
        }
    }
}

/// Immutable result of the extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Curated name → papers.
    pub known: MentionIndex,
    /// Novel surface token → papers.
    pub novel: MentionIndex,
    /// Papers scanned this run, in corpus order.
    pub processed: Vec<String>,
}

impl Extraction {
    /// Known names that have at least one paper.
    pub fn known_with_papers(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.known
            .iter()
            .filter(|(_, papers)| !papers.is_empty())
            .map(|(name, papers)| (name.as_str(), papers))
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.novel.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_ids_are_sets() {
        let mut acc = MentionAccumulator::new();
        acc.record_known("knownGene1", "WBPaper1");
        acc.record_known("knownGene1", "WBPaper1");
        acc.record_known("knownGene1", "WBPaper2");
        let ex = acc.finish();
        assert_eq!(ex.known["knownGene1"].len(), 2);
    }

    #[test]
    fn novel_keys_keep_surface_case() {
        let mut acc = MentionAccumulator::new();
        acc.record_novel("abcIs789", "WBPaper1");
        acc.record_novel("ABCIs789", "WBPaper1");
        let ex = acc.finish();
        assert_eq!(ex.novel.len(), 2);
    }

    #[test]
    fn processed_keeps_first_occurrence_order() {
        let mut acc = MentionAccumulator::new();
        acc.mark_processed("WBPaper2");
        acc.mark_processed("WBPaper1");
        acc.mark_processed("WBPaper2");
        assert_eq!(acc.processed_count(), 2);
        assert_eq!(acc.finish().processed, vec!["WBPaper2", "WBPaper1"]);
    }

    #[test]
    fn empty_extraction() {
        let ex = MentionAccumulator::new().finish();
        assert!(ex.is_empty());
        assert_eq!(ex.known_with_papers().count(), 0);
    }
}
