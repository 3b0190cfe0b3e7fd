//! Knowledge-base schema: the `trp_*` transgene tables and their history mirrors.
//!
//! Every live table keyed by `joinkey` (the bare identifier number) has an
//! `_hst` twin with the same columns and no uniqueness constraints; history
//! rows are only ever appended.

/// Curator tag written on records created by this pipeline.
pub const SYSTEM_CURATOR: &str = "WBPerson4793";

/// Status value that excludes a record from the curated vocabulary.
pub const STATUS_INVALID: &str = "invalid";

pub const SCHEMA_SQL: &str = r#"
-- Identifier table: joinkey is the sequence number, trp_name the WBTransgene id.
CREATE TABLE IF NOT EXISTS trp_name (
    joinkey INTEGER NOT NULL,
    trp_name TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_trp_name_joinkey ON trp_name(joinkey);

CREATE TABLE IF NOT EXISTS trp_name_hst (
    joinkey INTEGER NOT NULL,
    trp_name_hst TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Public (display) names.
CREATE TABLE IF NOT EXISTS trp_publicname (
    joinkey INTEGER NOT NULL,
    trp_publicname TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_trp_publicname_joinkey ON trp_publicname(joinkey);
CREATE INDEX IF NOT EXISTS idx_trp_publicname_name ON trp_publicname(trp_publicname);

CREATE TABLE IF NOT EXISTS trp_publicname_hst (
    joinkey INTEGER NOT NULL,
    trp_publicname_hst TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Paper associations: quoted, comma-joined WBPaper ids.
CREATE TABLE IF NOT EXISTS trp_paper (
    joinkey INTEGER NOT NULL,
    trp_paper TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_trp_paper_joinkey ON trp_paper(joinkey);

CREATE TABLE IF NOT EXISTS trp_paper_hst (
    joinkey INTEGER NOT NULL,
    trp_paper_hst TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Curator of record.
CREATE TABLE IF NOT EXISTS trp_curator (
    joinkey INTEGER NOT NULL,
    trp_curator TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_trp_curator_joinkey ON trp_curator(joinkey);

CREATE TABLE IF NOT EXISTS trp_curator_hst (
    joinkey INTEGER NOT NULL,
    trp_curator_hst TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Curation status; 'invalid' hides a record from the vocabulary.
CREATE TABLE IF NOT EXISTS trp_status (
    joinkey INTEGER NOT NULL,
    trp_status TEXT NOT NULL,
    trp_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_trp_status_joinkey ON trp_status(joinkey);

-- Public name -> identifier lookup for curated transgenes.
CREATE VIEW IF NOT EXISTS trp_transgene AS
    SELECT n.joinkey AS id,
           p.trp_publicname AS trp_transgene,
           n.trp_name AS object
    FROM trp_name n
    JOIN trp_publicname p ON p.joinkey = n.joinkey;
"#;

/// Tables written for every new transgene, in insertion order, with their
/// history twins.
pub const NOVEL_TABLES: [(&str, &str); 4] = [
    ("trp_name", "trp_name_hst"),
    ("trp_publicname", "trp_publicname_hst"),
    ("trp_paper", "trp_paper_hst"),
    ("trp_curator", "trp_curator_hst"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_twice() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'trp_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 9);
    }

    #[test]
    fn every_live_table_has_a_history_twin() {
        for (live, hst) in NOVEL_TABLES {
            assert_eq!(format!("{live}_hst"), hst);
            assert!(SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {hst} (")));
        }
    }
}
