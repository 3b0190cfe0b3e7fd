//! Mention extraction: curated names and novel transgene-shaped tokens.
//!
//! - [`KnownMatcher`] decides whether a curated name is mentioned in a unit of
//!   text under the boundary rules in [`known::BoundaryRule`].
//! - [`NovelDetector`] finds `{1-3 letters}{Is|In|Si|Ex}{digits}[letter]`
//!   tokens that are not curated.
//! - [`MentionAccumulator`] collects per-name paper-id sets across a run and is
//!   finished once into an immutable [`Extraction`].

pub mod accumulator;
pub mod known;
pub mod novel;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::text::normalize_segments;

pub use accumulator::{Extraction, MentionAccumulator};
pub use known::{BoundaryRule, KnownMatcher};
pub use novel::NovelDetector;

/// Transgene name → ids of the papers mentioning it in this run.
pub type MentionIndex = BTreeMap<String, BTreeSet<String>>;

/// How names are compared against text and against the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CasePolicy {
    /// Exact code-point comparison.
    Sensitive,
    /// Compare lowercased forms.
    Insensitive,
}

impl CasePolicy {
    /// Fold a string into the form used for membership tests under this policy.
    pub fn fold(self, s: &str) -> String {
        match self {
            Self::Sensitive => s.to_string(),
            Self::Insensitive => s.to_lowercase(),
        }
    }
}

impl std::fmt::Display for CasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sensitive => f.write_str("sensitive"),
            Self::Insensitive => f.write_str("insensitive"),
        }
    }
}

/// The unit of text the boundary rules are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchScope {
    /// All sentences of a paper joined with two spaces.
    #[default]
    Document,
    /// Each sentence on its own.
    Sentence,
}

impl MatchScope {
    /// Turn a paper's normalized sentences into the units to match against.
    pub fn units(self, sentences: &[String]) -> Vec<String> {
        match self {
            Self::Document => vec![sentences.join("  ")],
            Self::Sentence => sentences.to_vec(),
        }
    }
}

/// Knobs for the extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Case policy for matching curated names in text.
    pub known_case: CasePolicy,
    /// Case policy for deciding whether a shaped token is already curated.
    pub novel_case: CasePolicy,
    /// Unit the boundary rules are evaluated against.
    pub scope: MatchScope,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            known_case: CasePolicy::Sensitive,
            novel_case: CasePolicy::Insensitive,
            scope: MatchScope::Document,
        }
    }
}

/// Matcher, detector and scope bundled for the per-paper loop.
#[derive(Debug)]
pub struct Extractor {
    known: KnownMatcher,
    novel: NovelDetector,
    scope: MatchScope,
}

impl Extractor {
    pub fn new<S: AsRef<str>>(
        vocabulary: &[S],
        options: ExtractOptions,
    ) -> Result<Self, ExtractError> {
        let names = vocabulary.iter().map(|s| AsRef::<str>::as_ref(s));
        Ok(Self {
            known: KnownMatcher::new(names.clone(), options.known_case)?,
            novel: NovelDetector::new(names, options.novel_case),
            scope: options.scope,
        })
    }

    pub fn known(&self) -> &KnownMatcher {
        &self.known
    }

    pub fn novel(&self) -> &NovelDetector {
        &self.novel
    }

    /// Scan one paper's sentences and record its mentions.
    ///
    /// Sentences are dash-normalized first. The paper is marked processed even
    /// when nothing is found.
    pub fn scan_paper<S: AsRef<str>>(
        &self,
        paper_id: &str,
        sentences: &[S],
        acc: &mut MentionAccumulator,
    ) {
        let normalized = normalize_segments(sentences);
        for unit in self.scope.units(&normalized) {
            for name in self.known.mentioned_in(&unit) {
                acc.record_known(name, paper_id);
            }
            for token in self.novel.novel_in(&unit) {
                acc.record_novel(token, paper_id);
            }
        }
        acc.mark_processed(paper_id);
    }
}


#[cfg(test)]
mod extractor_tests {
    use super::*;

    fn extractor(vocab: &[&str], scope: MatchScope) -> Extractor {
        Extractor::new(
            vocab,
            ExtractOptions {
                scope,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn default_options_pick_case_policies() {
        let ex = extractor(&["knownGene1", "abcIs1"], MatchScope::Document);
        assert_eq!(ex.known().policy(), CasePolicy::Sensitive);
        assert_eq!(ex.novel().policy(), CasePolicy::Insensitive);
        assert_eq!(ex.known().len(), 2);
    }

    #[test]
    fn known_and_novel_from_one_paper() {
        let ex = extractor(&["knownGene1"], MatchScope::Document);
        let mut acc = MentionAccumulator::new();
        ex.scan_paper(
            "WBPaper00000002",
            &[
                "This sentence contains an unknown transgene abcIs123.",
                "Another sentence with knownGene1.",
            ],
            &mut acc,
        );
        let out = acc.finish();
        assert_eq!(out.known["knownGene1"].len(), 1);
        assert!(out.novel.contains_key("abcIs123"));
        assert_eq!(out.processed, vec!["WBPaper00000002"]);
    }

    #[test]
    fn sentence_scope_sees_end_of_sentence() {
        // In document scope "abIs1?" is followed by more text; per sentence it ends the unit.
        let sentences = ["was it abIs1?", "yes it was"];
        let mut acc = MentionAccumulator::new();
        extractor(&["abIs1"], MatchScope::Sentence).scan_paper("P1", &sentences, &mut acc);
        assert!(acc.finish().known.contains_key("abIs1"));

        let mut acc = MentionAccumulator::new();
        extractor(&["abIs1"], MatchScope::Document).scan_paper("P1", &sentences, &mut acc);
        assert!(!acc.finish().known.contains_key("abIs1"));
    }

    #[test]
    fn dashes_are_normalized_before_matching() {
        let mut acc = MentionAccumulator::new();
        extractor(&["unc-119"], MatchScope::Document).scan_paper(
            "P1",
            &["rescued by unc\u{2010}119 and more"],
            &mut acc,
        );
        assert!(acc.finish().known.contains_key("unc-119"));
    }

    #[test]
    fn paper_without_mentions_is_still_processed() {
        let mut acc = MentionAccumulator::new();
        extractor(&["knownGene1"], MatchScope::Document).scan_paper(
            "WBPaper00000003",
            &["This sentence contains no transgenes."],
            &mut acc,
        );
        let out = acc.finish();
        assert!(out.is_empty());
        assert_eq!(out.processed.len(), 1);
    }
}
