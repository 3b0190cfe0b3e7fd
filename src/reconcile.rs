//! Merge a run's extracted mentions into the knowledge base.
//!
//! Two passes, both after extraction has finished:
//!
//! 1. **Known upsert.** For each curated name with papers, the `trp_paper` row
//!    is replaced by the set found in this run (overwrite, not union) and the
//!    new blob is appended to `trp_paper_hst`. One transaction per name.
//! 2. **Novel insert.** One write transaction covers the whole batch. The
//!    allocator is seeded from `MAX(joinkey)` read inside that transaction, and
//!    each new transgene writes `trp_name`, `trp_publicname`, `trp_paper`,
//!    `trp_curator` plus their `_hst` twins under its own savepoint.
//!
//! Any failure aborts reconciliation. Known upserts already committed stay
//! committed; the novel batch is all-or-nothing.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::allocator::IdentifierAllocator;
use crate::error::{ReconcileError, ReconcileResult, StoreError};
use crate::extract::Extraction;
use crate::store::schema::NOVEL_TABLES;
use crate::store::{
    KnowledgeBase, VocabularyFilter, delete_paper_association, format_papers, insert_value,
    lookup_transgene, max_transgene_number,
};

/// A transgene created during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatedTransgene {
    pub public_name: String,
    pub identifier: String,
    pub papers: usize,
}

/// What reconciliation wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Curated records whose paper association was replaced.
    pub known_updated: usize,
    /// Newly created records, in allocation order.
    pub allocated: Vec<AllocatedTransgene>,
}

/// Applies an [`Extraction`] to a [`KnowledgeBase`].
pub struct Reconciler<'kb> {
    kb: &'kb mut KnowledgeBase,
    curator: String,
    filter: VocabularyFilter,
}

impl<'kb> Reconciler<'kb> {
    pub fn new(kb: &'kb mut KnowledgeBase, curator: impl Into<String>) -> Self {
        Self {
            kb,
            curator: curator.into(),
            filter: VocabularyFilter::default(),
        }
    }

    /// Resolve known names under the same filter the vocabulary was loaded with.
    pub fn with_filter(mut self, filter: VocabularyFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run both passes.
    pub fn reconcile(&mut self, extraction: &Extraction) -> ReconcileResult<ReconcileSummary> {
        let known_updated = self.upsert_known(extraction)?;
        let allocated = self.insert_novel(extraction)?;
        Ok(ReconcileSummary {
            known_updated,
            allocated,
        })
    }

    /// Replace the paper association of every curated name found in this run.
    pub fn upsert_known(&mut self, extraction: &Extraction) -> ReconcileResult<usize> {
        let mut updated = 0;
        let filter = self.filter;
        for (name, papers) in extraction.known_with_papers() {
            let blob = format_papers(papers);
            self.kb
                .with_transaction::<_, _, ReconcileError>(&format!("known upsert \"{name}\""), |tx| {
                    let joinkey = lookup_transgene(tx, name, filter)?.ok_or_else(|| {
                        ReconcileError::VocabularySkew {
                            name: name.to_string(),
                        }
                    })?;
                    delete_paper_association(tx, joinkey)?;
                    for table in ["trp_paper", "trp_paper_hst"] {
                        insert_value(tx, table, joinkey, &blob)
                            .map_err(StoreError::query(format!("insert {table} for {joinkey}")))?;
                    }
                    Ok(())
                })?;
            tracing::debug!(transgene = name, papers = papers.len(), "replaced paper association");
            updated += 1;
        }
        Ok(updated)
    }

    /// Allocate identifiers for and insert every novel transgene.
    pub fn insert_novel(
        &mut self,
        extraction: &Extraction,
    ) -> ReconcileResult<Vec<AllocatedTransgene>> {
        if extraction.novel.is_empty() {
            return Ok(Vec::new());
        }
        let curator = self.curator.clone();
        self.kb.with_transaction::<_, _, ReconcileError>("novel insert", |tx| {
            let mut allocator = IdentifierAllocator::seeded(max_transgene_number(tx)?)?;
            let mut allocated = Vec::with_capacity(extraction.novel.len());
            for (name, papers) in &extraction.novel {
                let id = allocator.next_id()?;
                let joinkey = id.number() as i64;
                let identifier = id.to_string();
                let values = novel_values(&identifier, name, papers, &curator);

                let sp = tx
                    .savepoint()
                    .map_err(StoreError::transaction(format!("savepoint for \"{name}\"")))?;
                for ((live, hst), value) in NOVEL_TABLES.iter().zip(values.iter()) {
                    for table in [*live, *hst] {
                        insert_value(&sp, table, joinkey, value).map_err(|source| {
                            ReconcileError::PartialInsert {
                                name: name.clone(),
                                table,
                                source,
                            }
                        })?;
                    }
                }
                sp.commit()
                    .map_err(StoreError::transaction(format!("release savepoint for \"{name}\"")))?;

                tracing::info!(transgene = %name, id = %identifier, papers = papers.len(), "created transgene record");
                allocated.push(AllocatedTransgene {
                    public_name: name.clone(),
                    identifier,
                    papers: papers.len(),
                });
            }
            Ok(allocated)
        })
    }
}

/// Values for `trp_name`, `trp_publicname`, `trp_paper`, `trp_curator`, in
/// [`NOVEL_TABLES`] order.
fn novel_values(
    identifier: &str,
    public_name: &str,
    papers: &BTreeSet<String>,
    curator: &str,
) -> [String; 4] {
    [
        identifier.to_string(),
        public_name.to_string(),
        format_papers(papers),
        curator.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::TransgeneId;
    use crate::extract::MentionAccumulator;
    use crate::store::{SYSTEM_CURATOR, insert_curated, mark_invalid};

    fn kb_with_known() -> KnowledgeBase {
        let kb = KnowledgeBase::open_in_memory().unwrap();
        insert_curated(kb.connection(), TransgeneId::new(5).unwrap(), "knownGene1", "WBPerson1")
            .unwrap();
        kb
    }

    fn extraction(known: &[(&str, &str)], novel: &[(&str, &str)]) -> Extraction {
        let mut acc = MentionAccumulator::new();
        for (name, paper) in known {
            acc.record_known(name, paper);
        }
        for (name, paper) in novel {
            acc.record_novel(name, paper);
        }
        acc.finish()
    }

    #[test]
    fn known_upsert_writes_live_and_history() {
        let mut kb = kb_with_known();
        let ex = extraction(&[("knownGene1", "WBPaper00000001")], &[]);
        let summary = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap();
        assert_eq!(summary.known_updated, 1);
        let rec = kb.record(5).unwrap().unwrap();
        assert_eq!(rec.papers.as_deref(), Some("\"WBPaper00000001\""));
        assert_eq!(kb.history_len("trp_paper", 5).unwrap(), 1);
    }

    #[test]
    fn known_upsert_overwrites_previous_papers() {
        let mut kb = kb_with_known();
        insert_value(kb.connection(), "trp_paper", 5, "\"WBPaperOld\"").unwrap();
        let ex = extraction(&[("knownGene1", "WBPaperNew")], &[]);
        Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap();
        let rows = kb.paper_associations().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].blob, "\"WBPaperNew\"");
    }

    #[test]
    fn unknown_curated_name_is_vocabulary_skew() {
        let mut kb = kb_with_known();
        let ex = extraction(&[("renamedGene", "WBPaper1")], &[]);
        let err = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap_err();
        assert!(matches!(err, ReconcileError::VocabularySkew { ref name } if name == "renamedGene"));
        assert!(kb.paper_associations().unwrap().is_empty());
    }

    #[test]
    fn papers_go_to_the_live_record_not_the_invalid_one() {
        let mut kb = KnowledgeBase::open_in_memory().unwrap();
        insert_curated(kb.connection(), TransgeneId::new(3).unwrap(), "deadIs3", "WBPerson1")
            .unwrap();
        mark_invalid(kb.connection(), 3).unwrap();

        let first = extraction(&[], &[("deadIs3", "WBPaper00000001")]);
        let summary = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&first).unwrap();
        assert_eq!(summary.allocated[0].identifier, "WBTransgene00000004");

        let second = extraction(&[("deadIs3", "WBPaper00000002")], &[]);
        Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&second).unwrap();
        assert_eq!(
            kb.record(4).unwrap().unwrap().papers.as_deref(),
            Some("\"WBPaper00000002\"")
        );
        assert_eq!(kb.record(3).unwrap().unwrap().papers, None);
        assert_eq!(kb.history_len("trp_paper", 3).unwrap(), 0);
    }

    #[test]
    fn unfiltered_reconciler_resolves_invalid_records() {
        let mut kb = KnowledgeBase::open_in_memory().unwrap();
        insert_curated(kb.connection(), TransgeneId::new(3).unwrap(), "deadIs3", "WBPerson1")
            .unwrap();
        mark_invalid(kb.connection(), 3).unwrap();

        let ex = extraction(&[("deadIs3", "WBPaper00000001")], &[]);
        let err = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap_err();
        assert!(matches!(err, ReconcileError::VocabularySkew { .. }));

        Reconciler::new(&mut kb, SYSTEM_CURATOR)
            .with_filter(VocabularyFilter::unfiltered())
            .reconcile(&ex)
            .unwrap();
        assert_eq!(
            kb.record(3).unwrap().unwrap().papers.as_deref(),
            Some("\"WBPaper00000001\"")
        );
    }

    #[test]
    fn novel_insert_allocates_after_max() {
        let mut kb = kb_with_known();
        let ex = extraction(&[], &[("abcIs123", "WBPaper1"), ("xyzEx101a", "WBPaper2")]);
        let summary = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap();
        let ids: Vec<&str> = summary.allocated.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(ids, vec!["WBTransgene00000006", "WBTransgene00000007"]);

        let rec = kb.record_by_name("abcIs123").unwrap().unwrap();
        assert_eq!(rec.identifier, "WBTransgene00000006");
        assert_eq!(rec.papers.as_deref(), Some("\"WBPaper1\""));
        assert_eq!(rec.curator.as_deref(), Some(SYSTEM_CURATOR));
        for table in ["trp_name", "trp_publicname", "trp_paper", "trp_curator"] {
            assert_eq!(kb.history_len(table, 6).unwrap(), 1, "{table}_hst");
        }
    }

    #[test]
    fn case_variants_get_distinct_identifiers() {
        let mut kb = KnowledgeBase::open_in_memory().unwrap();
        let ex = extraction(&[], &[("abcIs789", "P1"), ("ABCIs789", "P2")]);
        let summary = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap();
        assert_eq!(summary.allocated.len(), 2);
        assert_ne!(summary.allocated[0].identifier, summary.allocated[1].identifier);
    }

    #[test]
    fn failed_novel_batch_leaves_no_partial_record() {
        let mut kb = KnowledgeBase::open_in_memory().unwrap();
        kb.connection()
            .execute_batch(
                "CREATE TRIGGER reject_curator BEFORE INSERT ON trp_curator
                 WHEN NEW.joinkey = 2
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        let ex = extraction(&[], &[("aIs1", "P1"), ("bIs2", "P2")]);
        let err = Reconciler::new(&mut kb, SYSTEM_CURATOR).reconcile(&ex).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::PartialInsert { table: "trp_curator", .. }
        ));
        assert_eq!(max_transgene_number(kb.connection()).unwrap(), None);
        assert_eq!(kb.history_len("trp_name", 1).unwrap(), 0);
    }
}
