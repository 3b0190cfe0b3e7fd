//! Corpus loading errors.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("failed to read corpus manifest: {path}")]
    #[diagnostic(
        code(trp::corpus::manifest_read),
        help("Pass the path of an existing corpus.toml with --corpus.")
    )]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corpus manifest: {path}: {message}")]
    #[diagnostic(
        code(trp::corpus::manifest_parse),
        help("Each paper is a [[paper]] table with at least `id` and `text`.")
    )]
    ManifestParse { path: String, message: String },

    #[error("paper {paper} has an unreadable `added` date: {value:?}")]
    #[diagnostic(
        code(trp::corpus::bad_date),
        help("Dates are written YYYY-MM-DD or YYYYMMDD.")
    )]
    BadDate { paper: String, value: String },

    #[error("paper {paper} is listed more than once")]
    #[diagnostic(
        code(trp::corpus::duplicate_paper),
        help("Paper ids must be unique within a manifest.")
    )]
    DuplicatePaper { paper: String },

    #[error("cannot read text of paper {paper} from {path}")]
    #[diagnostic(
        code(trp::corpus::text_read),
        help("Text paths are resolved relative to the manifest directory.")
    )]
    TextRead {
        paper: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type CorpusResult<T> = std::result::Result<T, CorpusError>;
