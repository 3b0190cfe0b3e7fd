//! Curated-name matching under word-boundary heuristics.
//!
//! A curated name counts as mentioned in a unit of text when any of the
//! [`BoundaryRule`]s holds. The rules overlap. Between them they accept the
//! name as a standalone word, at either end of the unit, and in citation style
//! `(name)` / `name,`, and reject it when glued to other letters
//! (`xknownGene1y`).
//!
//! The `regex` crate has no look-around, so each rule consumes its trailing
//! delimiter. Only match existence is used.

use regex::{Regex, RegexBuilder};

use crate::error::ExtractError;
use crate::extract::CasePolicy;

/// Upper bound for the compiled size of one name's matcher.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// One of the boundary heuristics a curated name can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryRule {
    /// Name opens the unit and is followed by space, `:`, `,`, `;` or `.`.
    StartOfUnit,
    /// Whitespace (or start) before; whitespace, `:,;.` or end after.
    Standalone,
    /// Name closes the unit, optionally followed by one `:,;.!?`.
    EndOfUnit,
    /// `(name`, `(name)`, `name)` or `name,` citation style.
    Parenthetical,
}

impl BoundaryRule {
    pub const ALL: [Self; 4] = [
        Self::StartOfUnit,
        Self::Standalone,
        Self::EndOfUnit,
        Self::Parenthetical,
    ];

    /// Regex fragment for this rule around an already-escaped name.
    pub fn pattern(self, escaped: &str) -> String {
        match self {
            Self::StartOfUnit => format!(r"^{escaped}[ :,;.]"),
            Self::Standalone => format!(r"(?:^|\s){escaped}(?:[\s:,;.]|$)"),
            Self::EndOfUnit => format!(r"(?:^|\s){escaped}[:,;.!?]?\s*$"),
            Self::Parenthetical => {
                format!(r"(?:^|\s)(?:\({escaped}[),]?|{escaped}[),])(?:[\s.,;:)]|$)")
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartOfUnit => "start-of-unit",
            Self::Standalone => "standalone",
            Self::EndOfUnit => "end-of-unit",
            Self::Parenthetical => "parenthetical",
        }
    }
}

impl std::fmt::Display for BoundaryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compile(pattern: &str, policy: CasePolicy, name: &str) -> Result<Regex, ExtractError> {
    RegexBuilder::new(pattern)
        .case_insensitive(policy == CasePolicy::Insensitive)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| ExtractError::Pattern {
            name: name.to_string(),
            message: e.to_string(),
        })
}

/// A curated name with its combined boundary matcher.
#[derive(Debug)]
struct CompiledName {
    name: String,
    escaped: String,
    regex: Regex,
}

/// Matches curated transgene names in text.
#[derive(Debug)]
pub struct KnownMatcher {
    names: Vec<CompiledName>,
    policy: CasePolicy,
}

impl KnownMatcher {
    /// Compile one matcher per distinct vocabulary name.
    pub fn new<I, S>(vocabulary: I, policy: CasePolicy) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = std::collections::BTreeSet::new();
        let mut names = Vec::new();
        for name in vocabulary {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(ExtractError::EmptyName);
            }
            if !seen.insert(name.to_string()) {
                continue;
            }
            let escaped = regex::escape(name);
            let combined = BoundaryRule::ALL
                .iter()
                .map(|rule| format!("(?:{})", rule.pattern(&escaped)))
                .collect::<Vec<_>>()
                .join("|");
            names.push(CompiledName {
                name: name.to_string(),
                regex: compile(&combined, policy, name)?,
                escaped,
            });
        }
        Ok(Self { names, policy })
    }

    /// Number of distinct curated names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn policy(&self) -> CasePolicy {
        self.policy
    }

    /// Curated names mentioned in `unit`, in vocabulary order.
    ///
    /// Yields the canonical vocabulary string, not the matched text.
    pub fn mentioned_in<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.names
            .iter()
            .filter(move |c| self.could_contain(unit, &c.name) && c.regex.is_match(unit))
            .map(|c| c.name.as_str())
    }

    /// The first boundary rule under which `name` is mentioned in `unit`.
    ///
    /// Returns `None` if `name` is not curated or is not mentioned.
    pub fn matched_rule(&self, name: &str, unit: &str) -> Option<BoundaryRule> {
        let compiled = self.names.iter().find(|c| c.name == name)?;
        BoundaryRule::ALL.into_iter().find(|rule| {
            compile(&rule.pattern(&compiled.escaped), self.policy, name)
                .is_ok_and(|re| re.is_match(unit))
        })
    }

    // Literal prefilter; only sound for exact comparison.
    fn could_contain(&self, unit: &str, name: &str) -> bool {
        match self.policy {
            CasePolicy::Sensitive => unit.contains(name),
            CasePolicy::Insensitive => true,
        }
    }
}
