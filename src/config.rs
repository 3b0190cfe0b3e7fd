//! Run configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. Command-line flags are applied on top of the loaded value.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::{JOURNAL_ARTICLE, LoadRequest, TextOptions, parse_date};
use crate::extract::ExtractOptions;
use crate::store::{SYSTEM_CURATOR, VocabularyFilter};

/// Errors from configuration handling.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(trp::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(trp::config::parse),
        help("Check the TOML syntax and field names; `transgene-scan init --write-config` writes a template.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(trp::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid from-date {value:?}")]
    #[diagnostic(
        code(trp::config::from_date),
        help("Write the date as YYYY-MM-DD or YYYYMMDD.")
    )]
    FromDate { value: String },

    #[error("no corpus manifest configured")]
    #[diagnostic(
        code(trp::config::no_corpus),
        help("Pass --corpus <corpus.toml> or set `corpus` in the config file.")
    )]
    NoCorpus,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Which papers a run loads and how their text is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Only papers added on or after this date (`YYYY-MM-DD` or `YYYYMMDD`).
    /// When unset and a ledger directory exists, the newest complete ledger's
    /// run date is used. A run that hits `max_num_papers` leaves a partial
    /// ledger, which does not move this window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    /// Cap on papers per run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_papers: Option<usize>,
    #[serde(default = "default_pap_types")]
    pub pap_types: Vec<String>,
    #[serde(default = "default_true")]
    pub exclude_temp_pdf: bool,
    #[serde(default = "default_true")]
    pub include_supplemental: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            from_date: None,
            max_num_papers: None,
            pap_types: default_pap_types(),
            exclude_temp_pdf: true,
            include_supplemental: true,
        }
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Knowledge-base database file.
    #[serde(default = "default_db")]
    pub db: PathBuf,
    /// Corpus manifest (`corpus.toml`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,
    /// Directory of processed-paper ledger files. No ledger when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_dir: Option<PathBuf>,
    /// Curator tag written on new records.
    #[serde(default = "default_curator")]
    pub curator: String,
    /// Extract and report only; no store or ledger writes.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub extract: ExtractOptions,
    #[serde(default)]
    pub vocabulary: VocabularyFilter,
}

fn default_db() -> PathBuf {
    PathBuf::from("transgene.sqlite")
}
fn default_curator() -> String {
    SYSTEM_CURATOR.into()
}
fn default_pap_types() -> Vec<String> {
    vec![JOURNAL_ARTICLE.into()]
}
fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            db: default_db(),
            corpus: None,
            ledger_dir: None,
            curator: default_curator(),
            dry_run: false,
            selection: SelectionConfig::default(),
            extract: ExtractOptions::default(),
            vocabulary: VocabularyFilter::default(),
        }
    }
}

impl RunConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        path.map(Self::load).unwrap_or_else(|| Ok(Self::default()))
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// The configured from-date, parsed.
    pub fn from_date(&self) -> ConfigResult<Option<NaiveDate>> {
        self.selection
            .from_date
            .as_deref()
            .map(|raw| {
                parse_date(raw).ok_or_else(|| ConfigError::FromDate {
                    value: raw.to_string(),
                })
            })
            .transpose()
    }

    /// The corpus manifest path, required for a run.
    pub fn corpus_manifest(&self) -> ConfigResult<&Path> {
        self.corpus.as_deref().ok_or(ConfigError::NoCorpus)
    }

    /// A corpus load request for this configuration. Exclusions and the
    /// resolved from-date are filled in by the run.
    pub fn load_request(&self, from_date: Option<NaiveDate>) -> LoadRequest {
        LoadRequest {
            from_date,
            max_num_papers: self.selection.max_num_papers,
            exclude_ids: Default::default(),
            pap_types: self.selection.pap_types.clone(),
            exclude_temp_pdf: self.selection.exclude_temp_pdf,
        }
    }

    /// Text options used by the extraction stage: original case, split into
    /// sentences, supplemental material as configured.
    pub fn text_options(&self) -> TextOptions {
        TextOptions {
            include_supplemental: self.selection.include_supplemental,
            split_sentences: true,
            lowercase: false,
        }
    }
}
