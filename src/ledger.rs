//! Processed-paper ledger files.
//!
//! Each run that reconciles against the store leaves a plain-text file in the
//! ledger directory with one paper id per line, named
//! `{run:%Y%m%d}_{from}_results.csv`. The next run unions every line of every
//! file into its exclusion set, and (unless told otherwise) starts its date
//! window at the newest file's run date.
//!
//! A run cut short by `max_num_papers` writes `{run}_{from}_partial.csv`
//! instead. Its ids still count as processed, but its date never moves the
//! window, so papers the cap left behind stay selectable.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use miette::Diagnostic;
use thiserror::Error;

/// Errors from ledger directory operations.
#[derive(Debug, Error, Diagnostic)]
pub enum LedgerError {
    #[error("cannot create ledger directory {path}")]
    #[diagnostic(
        code(trp::ledger::create_dir),
        help("Check that the parent directory exists and is writable.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read ledger {path}")]
    #[diagnostic(
        code(trp::ledger::read),
        help("Ledger files must be readable UTF-8 text with one paper id per line.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write ledger {path}")]
    #[diagnostic(
        code(trp::ledger::write),
        help(
            "The run's store writes already happened. Write the processed ids by \
             hand or the next run will re-scan these papers."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

const RUN_DATE_FORMAT: &str = "%Y%m%d";
const RESULTS_SUFFIX: &str = "results.csv";
const PARTIAL_SUFFIX: &str = "partial.csv";

/// File name for a run's ledger.
pub fn ledger_file_name(
    run_date: NaiveDate,
    from_date: Option<NaiveDate>,
    partial: bool,
) -> String {
    let from = from_date
        .map(|d| d.format(RUN_DATE_FORMAT).to_string())
        .unwrap_or_else(|| "all".into());
    let suffix = if partial { PARTIAL_SUFFIX } else { RESULTS_SUFFIX };
    format!("{}_{from}_{suffix}", run_date.format(RUN_DATE_FORMAT))
}

/// Run date encoded in a ledger file name, if it has one.
pub fn run_date_of(file_name: &str) -> Option<NaiveDate> {
    let prefix = file_name.split('_').next()?;
    NaiveDate::parse_from_str(prefix, RUN_DATE_FORMAT).ok()
}

/// Whether a ledger file name marks a run truncated by the paper cap.
pub fn is_partial(file_name: &str) -> bool {
    file_name.contains("_partial.")
}

/// A directory of ledger files.
#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> LedgerResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| LedgerError::CreateDir {
            path: self.dir.display().to_string(),
            source: e,
        })
    }

    /// Ledger files in name order. Creates the directory if missing.
    pub fn files(&self) -> LedgerResult<Vec<PathBuf>> {
        self.ensure_dir()?;
        let entries = std::fs::read_dir(&self.dir).map_err(|e| LedgerError::Read {
            path: self.dir.display().to_string(),
            source: e,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                !p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Union of every paper id recorded in any ledger file.
    pub fn processed_ids(&self) -> LedgerResult<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for path in self.files()? {
            let content = std::fs::read_to_string(&path).map_err(|e| LedgerError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            ids.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(ids)
    }

    /// Run date of the newest complete ledger file whose name carries one.
    pub fn latest_run_date(&self) -> LedgerResult<Option<NaiveDate>> {
        Ok(self
            .files()?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter(|n| !is_partial(n))
            .filter_map(run_date_of)
            .max())
    }

    /// Write the ids processed by a run. Never overwrites an earlier ledger.
    pub fn write(
        &self,
        run_date: NaiveDate,
        from_date: Option<NaiveDate>,
        paper_ids: &[String],
        partial: bool,
    ) -> LedgerResult<PathBuf> {
        self.ensure_dir()?;
        let base = ledger_file_name(run_date, from_date, partial);
        let stem = base.trim_end_matches(".csv");
        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                base.clone()
            } else {
                format!("{stem}.{attempt}.csv")
            };
            let path = self.dir.join(name);
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    let write_err = |e| LedgerError::Write {
                        path: path.display().to_string(),
                        source: e,
                    };
                    for id in paper_ids {
                        writeln!(file, "{id}").map_err(write_err)?;
                    }
                    file.sync_all().map_err(write_err)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(LedgerError::Write {
                        path: path.display().to_string(),
                        source: e,
                    });
                }
            }
        }
    }
}
