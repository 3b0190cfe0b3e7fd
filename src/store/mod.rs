//! SQLite-backed transgene knowledge base.
//!
//! [`KnowledgeBase`] owns a single connection. Reads go straight through the
//! connection; multi-statement writes go through
//! [`KnowledgeBase::with_transaction`], which opens a `BEGIN IMMEDIATE`
//! transaction (taking the database write lock up front) and commits only when
//! the closure succeeds. A failed or panicking closure drops the transaction,
//! which rolls it back.

pub mod association;
pub mod schema;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use crate::allocator::TransgeneId;
use crate::error::{StoreError, StoreResult};

pub use association::{MalformedAssociation, format_papers, parse_papers};
pub use schema::{STATUS_INVALID, SYSTEM_CURATOR};

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Filters applied when loading the curated vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyFilter {
    /// Skip records whose public name is just their WBTransgene id.
    pub exclude_id_used_as_name: bool,
    /// Skip records marked `invalid` in `trp_status`.
    pub exclude_invalid: bool,
}

impl Default for VocabularyFilter {
    fn default() -> Self {
        Self {
            exclude_id_used_as_name: true,
            exclude_invalid: true,
        }
    }
}

impl VocabularyFilter {
    /// Every record, invalid or not.
    pub fn unfiltered() -> Self {
        Self {
            exclude_id_used_as_name: false,
            exclude_invalid: false,
        }
    }
}

/// One stored `trp_paper` row.
#[derive(Debug, Clone)]
pub struct PaperAssociationRow {
    pub joinkey: i64,
    pub blob: String,
}

/// A transgene record assembled from the live tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransgeneRecord {
    pub number: i64,
    pub identifier: String,
    pub public_name: Option<String>,
    pub papers: Option<String>,
    pub curator: Option<String>,
}

/// The transgene knowledge base.
pub struct KnowledgeBase {
    conn: Connection,
    path: Option<PathBuf>,
}

impl KnowledgeBase {
    /// Open (or create) a knowledge base file and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let kb = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        kb.prepare()?;
        Ok(kb)
    }

    /// Open a private in-memory knowledge base (for testing and dry runs).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        let kb = Self { conn, path: None };
        kb.prepare()?;
        Ok(kb)
    }

    fn prepare(&self) -> StoreResult<()> {
        self.conn
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(StoreError::query("set busy timeout"))?;
        self.conn
            .execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::query("apply schema"))
    }

    /// Database file path (`None` for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw connection, for read-only inspection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction and commit on success.
    pub fn with_transaction<F, T, E>(&mut self, context: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::transaction(format!("begin {context}")))?;
        let value = f(&mut tx)?;
        tx.commit()
            .map_err(StoreError::transaction(format!("commit {context}")))?;
        Ok(value)
    }

    /// Curated public names, sorted and deduplicated. Blank names are never
    /// returned.
    pub fn curated_transgenes(&self, filter: VocabularyFilter) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT DISTINCT t.trp_transgene FROM trp_transgene t
                 WHERE TRIM(t.trp_transgene) <> ''
                   AND (?1 = 0 OR t.trp_transgene <> t.object)
                   AND (?2 = 0 OR NOT EXISTS (
                        SELECT 1 FROM trp_status s
                        WHERE s.joinkey = t.id AND s.trp_status = ?3))
                 ORDER BY t.trp_transgene",
            )
            .map_err(StoreError::query("prepare vocabulary"))?;
        let rows = stmt
            .query_map(
                params![
                    filter.exclude_id_used_as_name,
                    filter.exclude_invalid,
                    STATUS_INVALID
                ],
                |row| row.get::<_, String>(0),
            )
            .map_err(StoreError::query("load vocabulary"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query("read vocabulary"))
    }

    /// Every live paper-association row.
    pub fn paper_associations(&self) -> StoreResult<Vec<PaperAssociationRow>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT joinkey, trp_paper FROM trp_paper ORDER BY joinkey")
            .map_err(StoreError::query("prepare paper associations"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PaperAssociationRow {
                    joinkey: row.get(0)?,
                    blob: row.get(1)?,
                })
            })
            .map_err(StoreError::query("load paper associations"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query("read paper associations"))
    }

    /// Union of every paper id already associated with any transgene.
    ///
    /// Rows whose blob cannot be parsed contribute nothing and are logged.
    pub fn associated_paper_ids(&self) -> StoreResult<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for row in self.paper_associations()? {
            match parse_papers(&row.blob) {
                Ok(papers) => ids.extend(papers),
                Err(e) => {
                    tracing::warn!(joinkey = row.joinkey, error = %e, "skipping malformed paper association");
                }
            }
        }
        Ok(ids)
    }

    /// Assemble the live record for an identifier number.
    pub fn record(&self, number: i64) -> StoreResult<Option<TransgeneRecord>> {
        let identifier: Option<String> = self
            .conn
            .query_row(
                "SELECT trp_name FROM trp_name WHERE joinkey = ?1",
                params![number],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::query("read trp_name"))?;
        let Some(identifier) = identifier else {
            return Ok(None);
        };
        Ok(Some(TransgeneRecord {
            number,
            identifier,
            public_name: self.latest_value("trp_publicname", number)?,
            papers: self.latest_value("trp_paper", number)?,
            curator: self.latest_value("trp_curator", number)?,
        }))
    }

    /// Find a record by public name, preferring one that passes the default
    /// vocabulary filter.
    pub fn record_by_name(&self, public_name: &str) -> StoreResult<Option<TransgeneRecord>> {
        let number = match lookup_transgene(&self.conn, public_name, VocabularyFilter::default())? {
            Some(number) => Some(number),
            None => lookup_transgene(&self.conn, public_name, VocabularyFilter::unfiltered())?,
        };
        match number {
            Some(number) => self.record(number),
            None => Ok(None),
        }
    }

    /// Number of history rows for `joinkey` in the `_hst` twin of `table`.
    pub fn history_len(&self, table: &str, joinkey: i64) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}_hst WHERE joinkey = ?1");
        self.conn
            .query_row(&sql, params![joinkey], |row| row.get(0))
            .map_err(StoreError::query(format!("count {table}_hst")))
    }

    fn latest_value(&self, table: &str, joinkey: i64) -> StoreResult<Option<String>> {
        let sql = format!("SELECT {table} FROM {table} WHERE joinkey = ?1 ORDER BY rowid DESC LIMIT 1");
        self.conn
            .query_row(&sql, params![joinkey], |row| row.get(0))
            .optional()
            .map_err(StoreError::query(format!("read {table}")))
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("path", &self.path)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Statement helpers usable on a plain connection or inside a transaction.
// ---------------------------------------------------------------------------

/// Identifier number of the curated record with this public name.
///
/// Applies the same filter as [`KnowledgeBase::curated_transgenes`], so a name
/// always resolves to a record that was part of the vocabulary. When several
/// records still qualify the lowest number wins.
pub fn lookup_transgene(
    conn: &Connection,
    public_name: &str,
    filter: VocabularyFilter,
) -> StoreResult<Option<i64>> {
    conn.query_row(
        "SELECT t.id FROM trp_transgene t
         WHERE t.trp_transgene = ?1
           AND (?2 = 0 OR t.trp_transgene <> t.object)
           AND (?3 = 0 OR NOT EXISTS (
                SELECT 1 FROM trp_status s
                WHERE s.joinkey = t.id AND s.trp_status = ?4))
         ORDER BY t.id LIMIT 1",
        params![
            public_name,
            filter.exclude_id_used_as_name,
            filter.exclude_invalid,
            STATUS_INVALID
        ],
        |row| row.get(0),
    )
    .optional()
    .map_err(StoreError::query(format!("look up \"{public_name}\"")))
}

/// Current maximum identifier number, `None` when the table is empty.
pub fn max_transgene_number(conn: &Connection) -> StoreResult<Option<i64>> {
    conn.query_row("SELECT MAX(joinkey) FROM trp_name", [], |row| row.get(0))
        .map_err(StoreError::query("read max trp_name.joinkey"))
}

/// Insert one `(joinkey, value)` row into `table`. Column name equals table name.
pub fn insert_value(
    conn: &Connection,
    table: &str,
    joinkey: i64,
    value: &str,
) -> rusqlite::Result<usize> {
    let sql = format!("INSERT INTO {table} (joinkey, {table}) VALUES (?1, ?2)");
    conn.prepare_cached(&sql)?.execute(params![joinkey, value])
}

/// Delete every `trp_paper` row for `joinkey`.
pub fn delete_paper_association(conn: &Connection, joinkey: i64) -> StoreResult<usize> {
    conn.execute("DELETE FROM trp_paper WHERE joinkey = ?1", params![joinkey])
        .map_err(StoreError::query(format!("delete trp_paper for {joinkey}")))
}

/// Insert a complete curated record (identifier, public name, curator).
///
/// Used to seed a knowledge base; reconciliation never calls it.
pub fn insert_curated(
    conn: &Connection,
    id: TransgeneId,
    public_name: &str,
    curator: &str,
) -> StoreResult<()> {
    let number = id.number() as i64;
    let identifier = id.to_string();
    for (table, value) in [
        ("trp_name", identifier.as_str()),
        ("trp_publicname", public_name),
        ("trp_curator", curator),
    ] {
        insert_value(conn, table, number, value)
            .map_err(StoreError::query(format!("seed {table}")))?;
    }
    Ok(())
}

/// Mark a record invalid so it drops out of the curated vocabulary.
pub fn mark_invalid(conn: &Connection, number: i64) -> StoreResult<()> {
    insert_value(conn, "trp_status", number, STATUS_INVALID)
        .map_err(StoreError::query("insert trp_status"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> KnowledgeBase {
        let kb = KnowledgeBase::open_in_memory().unwrap();
        let conn = kb.connection();
        insert_curated(conn, TransgeneId::new(1).unwrap(), "knownGene1", "WBPerson1").unwrap();
        insert_curated(conn, TransgeneId::new(2).unwrap(), "WBTransgene00000002", "WBPerson1")
            .unwrap();
        insert_curated(conn, TransgeneId::new(3).unwrap(), "deadIs3", "WBPerson1").unwrap();
        mark_invalid(conn, 3).unwrap();
        kb
    }

    #[test]
    fn vocabulary_filters() {
        let kb = seeded();
        assert_eq!(
            kb.curated_transgenes(VocabularyFilter::default()).unwrap(),
            vec!["knownGene1"]
        );
        let all = kb.curated_transgenes(VocabularyFilter::unfiltered()).unwrap();
        assert_eq!(all, vec!["WBTransgene00000002", "deadIs3", "knownGene1"]);
    }

    #[test]
    fn lookup_and_max() {
        let kb = seeded();
        let filter = VocabularyFilter::default();
        assert_eq!(lookup_transgene(kb.connection(), "knownGene1", filter).unwrap(), Some(1));
        assert_eq!(lookup_transgene(kb.connection(), "nope", filter).unwrap(), None);
        assert_eq!(max_transgene_number(kb.connection()).unwrap(), Some(3));
    }

    #[test]
    fn lookup_skips_invalid_records() {
        let kb = seeded();
        let conn = kb.connection();
        assert_eq!(lookup_transgene(conn, "deadIs3", VocabularyFilter::default()).unwrap(), None);
        assert_eq!(
            lookup_transgene(conn, "deadIs3", VocabularyFilter::unfiltered()).unwrap(),
            Some(3)
        );
        assert_eq!(kb.record_by_name("deadIs3").unwrap().unwrap().number, 3);

        insert_curated(conn, TransgeneId::new(4).unwrap(), "deadIs3", SYSTEM_CURATOR).unwrap();
        assert_eq!(lookup_transgene(conn, "deadIs3", VocabularyFilter::default()).unwrap(), Some(4));
        assert_eq!(kb.record_by_name("deadIs3").unwrap().unwrap().number, 4);
    }

    #[test]
    fn blank_public_names_are_not_vocabulary() {
        let kb = seeded();
        insert_curated(kb.connection(), TransgeneId::new(8).unwrap(), "", "WBPerson1").unwrap();
        insert_curated(kb.connection(), TransgeneId::new(9).unwrap(), "  ", "WBPerson1").unwrap();
        assert_eq!(
            kb.curated_transgenes(VocabularyFilter::unfiltered()).unwrap(),
            vec!["WBTransgene00000002", "deadIs3", "knownGene1"]
        );
    }

    #[test]
    fn max_of_empty_store_is_none() {
        let kb = KnowledgeBase::open_in_memory().unwrap();
        assert_eq!(max_transgene_number(kb.connection()).unwrap(), None);
    }

    #[test]
    fn associated_ids_skip_malformed_rows() {
        let kb = seeded();
        insert_value(kb.connection(), "trp_paper", 1, "\"WBPaper1\",\"WBPaper2\"").unwrap();
        insert_value(kb.connection(), "trp_paper", 3, "WBPaper9, broken").unwrap();
        let ids = kb.associated_paper_ids().unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["WBPaper1", "WBPaper2"]);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let mut kb = seeded();
        let result: StoreResult<()> = kb.with_transaction("test", |tx| {
            insert_value(tx, "trp_paper", 1, "\"WBPaper1\"")
                .map_err(StoreError::query("insert"))?;
            Err(StoreError::Open {
                path: "x".into(),
                message: "forced".into(),
            })
        });
        assert!(result.is_err());
        assert!(kb.paper_associations().unwrap().is_empty());
    }

    #[test]
    fn record_assembles_live_tables() {
        let kb = seeded();
        let rec = kb.record_by_name("knownGene1").unwrap().unwrap();
        assert_eq!(rec.identifier, "WBTransgene00000001");
        assert_eq!(rec.curator.as_deref(), Some("WBPerson1"));
        assert_eq!(rec.papers, None);
        assert!(kb.record(99).unwrap().is_none());
    }

    #[test]
    fn duplicate_identifier_number_is_rejected() {
        let kb = seeded();
        let err = insert_value(kb.connection(), "trp_name", 1, "WBTransgene00000001");
        assert!(err.is_err());
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trp.sqlite");
        {
            let kb = KnowledgeBase::open(&path).unwrap();
            insert_curated(kb.connection(), TransgeneId::new(7).unwrap(), "abEx7", "WBPerson1")
                .unwrap();
        }
        let kb = KnowledgeBase::open(&path).unwrap();
        assert_eq!(kb.path(), Some(path.as_path()));
        assert_eq!(max_transgene_number(kb.connection()).unwrap(), Some(7));
    }
}
