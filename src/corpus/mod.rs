//! Literature corpus boundary.
//!
//! A [`Corpus`] is loaded once per run with a [`LoadRequest`] (date window,
//! paper cap, exclusion set, publication types) and then exposes its
//! [`Paper`]s. Paper text is produced lazily by [`Paper::text_docs`].
//!
//! Two implementations ship with the crate: [`ManifestCorpus`] reads a
//! `corpus.toml` listing plain-text files, and [`MemoryCorpus`] holds papers
//! built in code.

pub mod error;
pub mod manifest;
pub mod memory;
pub mod sentences;

use std::collections::BTreeSet;

use chrono::NaiveDate;

pub use error::{CorpusError, CorpusResult};
pub use manifest::ManifestCorpus;
pub use memory::{MemoryCorpus, MemoryPaper};
pub use sentences::split_sentences;

/// Publication type scanned when none is configured.
pub const JOURNAL_ARTICLE: &str = "Journal_article";

/// Parse a date written `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}

/// Selection criteria handed to [`Corpus::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Only papers added on or after this date. Papers without an `added`
    /// date are skipped when a window is set.
    pub from_date: Option<NaiveDate>,
    /// Cap on the number of papers loaded, applied after filtering.
    pub max_num_papers: Option<usize>,
    /// Paper ids that must not be loaded.
    pub exclude_ids: BTreeSet<String>,
    /// Accepted publication types. Empty accepts every type.
    pub pap_types: Vec<String>,
    /// Skip papers whose text comes from a temporary PDF.
    pub exclude_temp_pdf: bool,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self {
            from_date: None,
            max_num_papers: None,
            exclude_ids: BTreeSet::new(),
            pap_types: vec![JOURNAL_ARTICLE.into()],
            exclude_temp_pdf: true,
        }
    }
}

/// Bibliographic facts a corpus filters on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperMeta {
    pub id: String,
    pub pap_type: String,
    pub added: Option<NaiveDate>,
    pub temp_pdf: bool,
}

impl PaperMeta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pap_type: JOURNAL_ARTICLE.into(),
            added: None,
            temp_pdf: false,
        }
    }
}

impl LoadRequest {
    /// Whether a paper passes every filter except the cap.
    pub fn admits(&self, meta: &PaperMeta) -> bool {
        if self.exclude_ids.contains(&meta.id) {
            return false;
        }
        if self.exclude_temp_pdf && meta.temp_pdf {
            return false;
        }
        if !self.pap_types.is_empty() && !self.pap_types.iter().any(|t| *t == meta.pap_type) {
            return false;
        }
        match (self.from_date, meta.added) {
            (Some(from), Some(added)) => added >= from,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Filter candidates, order them by paper id and apply the cap.
    pub fn select<P, F>(&self, candidates: impl IntoIterator<Item = P>, meta: F) -> Vec<P>
    where
        F: Fn(&P) -> &PaperMeta,
    {
        let mut selected: Vec<P> = candidates
            .into_iter()
            .filter(|p| self.admits(meta(p)))
            .collect();
        selected.sort_by(|a, b| meta(a).id.cmp(&meta(b).id));
        if let Some(max) = self.max_num_papers {
            selected.truncate(max);
        }
        selected
    }
}

/// How a paper's text is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    pub include_supplemental: bool,
    pub split_sentences: bool,
    pub lowercase: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            include_supplemental: true,
            split_sentences: true,
            lowercase: false,
        }
    }
}

impl TextOptions {
    /// Apply the splitting and case options to one raw document.
    pub fn shape(&self, raw: &str, out: &mut Vec<String>) {
        let text = if self.lowercase {
            raw.to_lowercase()
        } else {
            raw.to_string()
        };
        if self.split_sentences {
            out.extend(split_sentences(&text));
        } else if !text.trim().is_empty() {
            out.push(text);
        }
    }
}

/// One paper of the corpus.
pub trait Paper {
    /// Stable paper identifier, e.g. `WBPaper00000001`.
    fn paper_id(&self) -> &str;

    /// The paper's text segments in reading order.
    fn text_docs(&self, options: TextOptions) -> CorpusResult<Vec<String>>;
}

/// A source of papers.
pub trait Corpus {
    type Paper: Paper;

    /// Select the papers for this run. Replaces any previous selection.
    fn load(&mut self, request: &LoadRequest) -> CorpusResult<()>;

    /// Papers selected by the last [`load`](Corpus::load), ordered by id.
    fn papers(&self) -> &[Self::Paper];
}
