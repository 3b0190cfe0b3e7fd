//! Run controller: one batch pass from exclusions to ledger.
//!
//! A [`Run`] walks the stages in [`RunStage`] order. Every stage runs inside
//! its own `tracing` span; the first error aborts the run and is returned as
//! is. All extraction finishes before the first store write.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::RunConfig;
use crate::corpus::{Corpus, Paper};
use crate::error::TransgeneResult;
use crate::extract::{Extraction, Extractor, MentionAccumulator};
use crate::ledger::Ledger;
use crate::reconcile::{ReconcileSummary, Reconciler};
use crate::store::KnowledgeBase;

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStage {
    LoadExclusions,
    LoadCorpus,
    Extract,
    Reconcile,
    EmitLedger,
    Done,
}

impl RunStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadExclusions => "load-exclusions",
            Self::LoadCorpus => "load-corpus",
            Self::Extract => "extract",
            Self::Reconcile => "reconcile",
            Self::EmitLedger => "emit-ledger",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stage: RunStage,
    pub run_date: String,
    /// Start of the date window, `None` for an unbounded run.
    pub from_date: Option<String>,
    pub dry_run: bool,
    pub vocabulary_size: usize,
    pub excluded_papers: usize,
    pub papers_loaded: usize,
    /// The selection reached `max_num_papers`, so the ledger is partial.
    pub truncated: bool,
    pub extraction: Extraction,
    pub reconcile: ReconcileSummary,
    pub ledger_file: Option<PathBuf>,
}

impl RunReport {
    /// Names that reached the reconcile stage with at least one paper.
    pub fn known_found(&self) -> usize {
        self.extraction.known_with_papers().count()
    }

    pub fn novel_found(&self) -> usize {
        self.extraction.novel.len()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {} (from {}){}",
            self.run_date,
            self.from_date.as_deref().unwrap_or("all"),
            if self.dry_run { " [dry run]" } else { "" }
        )?;
        writeln!(f, "  vocabulary:      {}", self.vocabulary_size)?;
        writeln!(f, "  excluded papers: {}", self.excluded_papers)?;
        writeln!(
            f,
            "  papers scanned:  {}{}",
            self.papers_loaded,
            if self.truncated { " (capped)" } else { "" }
        )?;
        writeln!(f, "  known found:     {}", self.known_found())?;
        writeln!(f, "  novel found:     {}", self.novel_found())?;
        writeln!(f, "  known updated:   {}", self.reconcile.known_updated)?;
        writeln!(f, "  allocated:       {}", self.reconcile.allocated.len())?;
        for a in &self.reconcile.allocated {
            writeln!(f, "    {} {} ({} papers)", a.identifier, a.public_name, a.papers)?;
        }
        if self.dry_run {
            for (name, papers) in &self.extraction.novel {
                writeln!(f, "    new? {name} ({} papers)", papers.len())?;
            }
        }
        match &self.ledger_file {
            Some(path) => write!(f, "  ledger:          {}", path.display()),
            None => write!(f, "  ledger:          (not written)"),
        }
    }
}

/// A single batch run over a corpus and a knowledge base.
pub struct Run<'a, C: Corpus> {
    kb: &'a mut KnowledgeBase,
    corpus: &'a mut C,
    config: &'a RunConfig,
    run_date: NaiveDate,
    stage: RunStage,
}

impl<'a, C: Corpus> Run<'a, C> {
    pub fn new(kb: &'a mut KnowledgeBase, corpus: &'a mut C, config: &'a RunConfig) -> Self {
        Self {
            kb,
            corpus,
            config,
            run_date: chrono::Local::now().date_naive(),
            stage: RunStage::LoadExclusions,
        }
    }

    /// Override the date stamped on the ledger file.
    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    /// Stage the run is in (or failed in).
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    fn enter(&mut self, stage: RunStage) -> tracing::span::EnteredSpan {
        self.stage = stage;
        tracing::info_span!("stage", name = stage.as_str()).entered()
    }

    /// Execute every stage.
    pub fn execute(&mut self) -> TransgeneResult<RunReport> {
        let config = self.config;
        let ledger = config.ledger_dir.as_ref().map(Ledger::new);

        let span = self.enter(RunStage::LoadExclusions);
        let mut exclude_ids = self.kb.associated_paper_ids()?;
        let from_kb = exclude_ids.len();
        if let Some(ledger) = &ledger {
            exclude_ids.extend(ledger.processed_ids()?);
        }
        let from_date = match config.from_date()? {
            Some(date) => Some(date),
            None => match &ledger {
                Some(ledger) => ledger.latest_run_date()?,
                None => None,
            },
        };
        tracing::info!(
            from_store = from_kb,
            total = exclude_ids.len(),
            from_date = ?from_date,
            "loaded exclusions"
        );
        drop(span);

        let span = self.enter(RunStage::LoadCorpus);
        let vocabulary = self.kb.curated_transgenes(config.vocabulary)?;
        let excluded_papers = exclude_ids.len();
        let mut request = config.load_request(from_date);
        request.exclude_ids = exclude_ids;
        self.corpus.load(&request)?;
        let papers_loaded = self.corpus.papers().len();
        let truncated = request.max_num_papers.is_some_and(|cap| papers_loaded >= cap);
        tracing::info!(
            vocabulary = vocabulary.len(),
            papers = papers_loaded,
            truncated,
            "loaded corpus and vocabulary"
        );
        drop(span);

        let span = self.enter(RunStage::Extract);
        let extractor = Extractor::new(&vocabulary, config.extract)?;
        tracing::debug!(
            names = extractor.known().len(),
            known_case = %extractor.known().policy(),
            novel_case = %extractor.novel().policy(),
            "compiled extractor"
        );
        let text_options = config.text_options();
        let mut acc = MentionAccumulator::new();
        for paper in self.corpus.papers() {
            let sentences = paper.text_docs(text_options)?;
            tracing::debug!(paper = paper.paper_id(), sentences = sentences.len(), "scanning paper");
            extractor.scan_paper(paper.paper_id(), &sentences, &mut acc);
        }
        let extraction = acc.finish();
        tracing::info!(
            processed = extraction.processed.len(),
            known = extraction.known.len(),
            novel = extraction.novel.len(),
            "extraction finished"
        );
        drop(span);

        let span = self.enter(RunStage::Reconcile);
        let reconcile = if config.dry_run {
            tracing::info!("dry run, skipping reconciliation");
            ReconcileSummary::default()
        } else {
            let summary = Reconciler::new(self.kb, config.curator.clone())
                .with_filter(config.vocabulary)
                .reconcile(&extraction)?;
            tracing::info!(
                known_updated = summary.known_updated,
                allocated = summary.allocated.len(),
                "reconciliation committed"
            );
            summary
        };
        drop(span);

        let span = self.enter(RunStage::EmitLedger);
        let ledger_file = match &ledger {
            Some(ledger) if !config.dry_run => {
                let path =
                    ledger.write(self.run_date, from_date, &extraction.processed, truncated)?;
                tracing::info!(
                    path = %path.display(),
                    papers = extraction.processed.len(),
                    partial = truncated,
                    "wrote ledger"
                );
                Some(path)
            }
            _ => None,
        };
        drop(span);

        self.stage = RunStage::Done;
        Ok(RunReport {
            stage: self.stage,
            run_date: self.run_date.format("%Y-%m-%d").to_string(),
            from_date: from_date.map(|d| d.format("%Y-%m-%d").to_string()),
            dry_run: config.dry_run,
            vocabulary_size: vocabulary.len(),
            excluded_papers,
            papers_loaded,
            truncated,
            extraction,
            reconcile,
            ledger_file,
        })
    }
}
