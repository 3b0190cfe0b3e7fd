//! Rich diagnostic error types for transgene-scan.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so a failed run says exactly which stage
//! broke and what to check. Every error is fatal to the run; nothing is retried.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::corpus::CorpusError;
use crate::ledger::LedgerError;

/// Top-level error type for a transgene-scan run.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum TransgeneError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Allocator(#[from] AllocatorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for run-level results.
pub type TransgeneResult<T> = std::result::Result<T, TransgeneError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("cannot open knowledge base at {path}: {message}")]
    #[diagnostic(
        code(trp::store::open),
        help(
            "Check that the database path exists and is writable. \
             Create a fresh knowledge base with `transgene-scan init`."
        )
    )]
    Open { path: String, message: String },

    #[error("query failed ({context}): {source}")]
    #[diagnostic(
        code(trp::store::query),
        help(
            "A statement against the knowledge base failed. Failed statements are \
             not retried; fix the cause and re-run."
        )
    )]
    Query {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("transaction failed ({context}): {source}")]
    #[diagnostic(
        code(trp::store::transaction),
        help(
            "The knowledge base could not begin or commit a transaction. \
             Another run may be holding the write lock; runs against the same \
             store must not overlap."
        )
    )]
    Transaction {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub(crate) fn query(context: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> Self {
        let context = context.into();
        move |source| Self::Query { context, source }
    }

    pub(crate) fn transaction(
        context: impl Into<String>,
    ) -> impl FnOnce(rusqlite::Error) -> Self {
        let context = context.into();
        move |source| Self::Transaction { context, source }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("cannot build matcher for curated name \"{name}\": {message}")]
    #[diagnostic(
        code(trp::extract::pattern),
        help(
            "The curated name could not be compiled into a boundary matcher. \
             Names are escaped literally, so this usually means the name is \
             pathologically long. Mark the record invalid or fix its public name."
        )
    )]
    Pattern { name: String, message: String },

    #[error("empty curated name in vocabulary")]
    #[diagnostic(
        code(trp::extract::empty_name),
        help("A curated record has an empty public name. Fix or invalidate it.")
    )]
    EmptyName,
}

// ---------------------------------------------------------------------------
// Allocator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AllocatorError {
    #[error("identifier space exhausted: {next} does not fit in 8 digits")]
    #[diagnostic(
        code(trp::allocator::exhausted),
        help(
            "WBTransgene identifiers are 8-digit zero-padded numbers. \
             The store already holds the largest representable identifier."
        )
    )]
    Exhausted { next: u64 },

    #[error("stored maximum identifier is negative: {value}")]
    #[diagnostic(
        code(trp::allocator::negative),
        help("trp_name.joinkey must hold positive sequence numbers. Inspect the table.")
    )]
    Negative { value: i64 },
}

// ---------------------------------------------------------------------------
// Reconciliation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReconcileError {
    #[error("curated transgene \"{name}\" has no record in the knowledge base")]
    #[diagnostic(
        code(trp::reconcile::vocabulary_skew),
        help(
            "The name was in the vocabulary loaded at the start of the run but \
             cannot be resolved to an identifier now. The store changed during \
             the run; re-run once curation edits are finished."
        )
    )]
    VocabularySkew { name: String },

    #[error("insert of novel transgene \"{name}\" failed at {table}: {source}")]
    #[diagnostic(
        code(trp::reconcile::partial_insert),
        help(
            "One of the eight statements for a new record failed. The enclosing \
             transaction was rolled back, so no partial record was kept. \
             No identifiers from this batch were persisted."
        )
    )]
    PartialInsert {
        name: String,
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Allocator(#[from] AllocatorError),
}

/// Result type for reconciliation.
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
