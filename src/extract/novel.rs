//! Detection of transgene-shaped tokens absent from the curated vocabulary.
//!
//! Shape: one to three letters, an allele-type marker (`Is`, `In`, `Si`, `Ex`),
//! one or more digits and an optional trailing letter, bounded by word
//! boundaries. The whole pattern is case-insensitive, so `XYZIs101` and
//! `abcex7a` are accepted. Tokens are reported with their original surface
//! case; `abcIs123` and `AbcIs123` are different novel transgenes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::CasePolicy;

static RE_TRANSGENE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z]{1,3}(?:Is|In|Si|Ex)[0-9]+[a-z]?\b").unwrap()
});

/// True if `token` is entirely one transgene-shaped identifier.
pub fn is_transgene_shaped(token: &str) -> bool {
    RE_TRANSGENE
        .find(token)
        .is_some_and(|m| m.start() == 0 && m.end() == token.len())
}

/// Finds novel transgene tokens in text.
#[derive(Debug)]
pub struct NovelDetector {
    known: HashSet<String>,
    policy: CasePolicy,
}

impl NovelDetector {
    /// Build a detector that filters out `vocabulary` under `policy`.
    pub fn new<I, S>(vocabulary: I, policy: CasePolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known = vocabulary
            .into_iter()
            .map(|name| policy.fold(name.as_ref()))
            .collect();
        Self { known, policy }
    }

    pub fn policy(&self) -> CasePolicy {
        self.policy
    }

    /// Whether `token` is curated under this detector's case policy.
    pub fn is_known(&self, token: &str) -> bool {
        self.known.contains(&self.policy.fold(token))
    }

    /// All transgene-shaped tokens in `text`, curated or not, in order.
    pub fn candidates<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        RE_TRANSGENE.find_iter(text).map(|m| m.as_str())
    }

    /// Novel transgene tokens in `text`, with their surface case, in order.
    pub fn novel_in<'a, 't: 'a>(&'a self, text: &'t str) -> impl Iterator<Item = &'t str> + 'a {
        self.candidates(text).filter(move |t| !self.is_known(t))
    }
}
