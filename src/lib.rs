// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # transgene-scan
//!
//! Finds transgene mentions in full-text papers and reconciles them into a
//! curated transgene knowledge base.
//!
//! ## Architecture
//!
//! - **Normalization** (`text`): dash folding applied to every sentence
//! - **Extraction** (`extract`): boundary-rule matching of curated names and
//!   detection of novel `{prefix}{Is|In|Si|Ex}{number}` tokens
//! - **Identifiers** (`allocator`): sequential `WBTransgeneNNNNNNNN` allocation
//! - **Storage** (`store`): SQLite `trp_*` tables with history mirrors
//! - **Reconciliation** (`reconcile`): paper-association overwrite for known
//!   names, transactional record creation for novel ones
//! - **Runs** (`pipeline`): exclusions → corpus → extract → reconcile → ledger
//!
//! ## Library usage
//!
//! ```no_run
//! use transgene_scan::config::RunConfig;
//! use transgene_scan::corpus::{MemoryCorpus, MemoryPaper};
//! use transgene_scan::pipeline::Run;
//! use transgene_scan::store::KnowledgeBase;
//!
//! let mut kb = KnowledgeBase::open("transgene.sqlite".as_ref()).unwrap();
//! let mut corpus = MemoryCorpus::new([MemoryPaper::new(
//!     "WBPaper00000001",
//!     ["Animals carrying abcIs123 were imaged."],
//! )]);
//! let config = RunConfig::default();
//! let report = Run::new(&mut kb, &mut corpus, &config).execute().unwrap();
//! println!("{report}");
//! ```

pub mod allocator;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod text;
