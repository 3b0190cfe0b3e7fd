//! Corpus described by a TOML manifest of plain-text files.
//!
//! ```toml
//! [[paper]]
//! id = "WBPaper00000001"
//! pap_type = "Journal_article"
//! added = "2026-09-01"
//! temp_pdf = false
//! text = "papers/WBPaper00000001.txt"
//! supplemental = ["papers/WBPaper00000001_supp.txt"]
//! ```
//!
//! Relative paths are resolved against the manifest's directory. Text files
//! are only read when [`Paper::text_docs`] is called.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{
    Corpus, CorpusError, CorpusResult, JOURNAL_ARTICLE, LoadRequest, Paper, PaperMeta,
    TextOptions, parse_date,
};

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    paper: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    #[serde(default = "default_pap_type")]
    pap_type: String,
    #[serde(default)]
    added: Option<String>,
    #[serde(default)]
    temp_pdf: bool,
    text: PathBuf,
    #[serde(default)]
    supplemental: Vec<PathBuf>,
}

fn default_pap_type() -> String {
    JOURNAL_ARTICLE.into()
}

/// A paper listed in a manifest.
#[derive(Debug, Clone)]
pub struct ManifestPaper {
    meta: PaperMeta,
    text: PathBuf,
    supplemental: Vec<PathBuf>,
}

impl ManifestPaper {
    pub fn meta(&self) -> &PaperMeta {
        &self.meta
    }

    fn read(&self, path: &Path) -> CorpusResult<String> {
        std::fs::read_to_string(path).map_err(|e| CorpusError::TextRead {
            paper: self.meta.id.clone(),
            path: path.display().to_string(),
            source: e,
        })
    }
}

impl Paper for ManifestPaper {
    fn paper_id(&self) -> &str {
        &self.meta.id
    }

    fn text_docs(&self, options: TextOptions) -> CorpusResult<Vec<String>> {
        let mut docs = Vec::new();
        options.shape(&self.read(&self.text)?, &mut docs);
        if options.include_supplemental {
            for path in &self.supplemental {
                options.shape(&self.read(path)?, &mut docs);
            }
        }
        Ok(docs)
    }
}

/// Corpus backed by a `corpus.toml` manifest.
#[derive(Debug, Clone)]
pub struct ManifestCorpus {
    path: PathBuf,
    available: Vec<ManifestPaper>,
    loaded: Vec<ManifestPaper>,
}

impl ManifestCorpus {
    /// Read and validate a manifest. Text files are not touched yet.
    pub fn open(path: &Path) -> CorpusResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CorpusError::ManifestRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: ManifestFile = toml::from_str(&content).map_err(|e| CorpusError::ManifestParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut seen = HashSet::new();
        let mut available = Vec::with_capacity(file.paper.len());
        for entry in file.paper {
            if !seen.insert(entry.id.clone()) {
                return Err(CorpusError::DuplicatePaper { paper: entry.id });
            }
            let added = match entry.added {
                Some(raw) => Some(parse_date(&raw).ok_or_else(|| CorpusError::BadDate {
                    paper: entry.id.clone(),
                    value: raw.clone(),
                })?),
                None => None,
            };
            available.push(ManifestPaper {
                meta: PaperMeta {
                    id: entry.id,
                    pap_type: entry.pap_type,
                    added,
                    temp_pdf: entry.temp_pdf,
                },
                text: base.join(entry.text),
                supplemental: entry.supplemental.into_iter().map(|p| base.join(p)).collect(),
            });
        }
        tracing::debug!(manifest = %path.display(), papers = available.len(), "read corpus manifest");
        Ok(Self {
            path: path.to_path_buf(),
            available,
            loaded: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of papers listed in the manifest.
    pub fn listed(&self) -> usize {
        self.available.len()
    }
}

impl Corpus for ManifestCorpus {
    type Paper = ManifestPaper;

    fn load(&mut self, request: &LoadRequest) -> CorpusResult<()> {
        self.loaded = request.select(self.available.iter().cloned(), ManifestPaper::meta);
        tracing::info!(
            listed = self.available.len(),
            selected = self.loaded.len(),
            excluded = request.exclude_ids.len(),
            "loaded corpus"
        );
        Ok(())
    }

    fn papers(&self) -> &[ManifestPaper] {
        &self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn write_corpus(dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir.join("papers")).unwrap();
        std::fs::write(
            dir.join("papers/p1.txt"),
            "We crossed knownGene1 into\nthe background. abcIs123 was bright.",
        )
        .unwrap();
        std::fs::write(dir.join("papers/p1_supp.txt"), "Strain list: xyEx7.").unwrap();
        std::fs::write(dir.join("papers/p2.txt"), "Nothing here.").unwrap();
        let manifest = dir.join("corpus.toml");
        std::fs::write(
            &manifest,
            r#"
[[paper]]
id = "WBPaper00000001"
added = "2026-09-01"
text = "papers/p1.txt"
supplemental = ["papers/p1_supp.txt"]

[[paper]]
id = "WBPaper00000002"
added = "20260801"
text = "papers/p2.txt"

[[paper]]
id = "WBPaper00000003"
pap_type = "Review"
text = "papers/missing.txt"
"#,
        )
        .unwrap();
        manifest
    }

    #[test]
    fn reads_and_filters() {
        let tmp = tempfile::TempDir::new().unwrap();
        let manifest = write_corpus(tmp.path());
        let mut corpus = ManifestCorpus::open(&manifest).unwrap();
        assert_eq!(corpus.listed(), 3);
        assert_eq!(corpus.path(), manifest.as_path());

        corpus
            .load(&LoadRequest {
                from_date: NaiveDate::from_ymd_opt(2026, 8, 15),
                ..LoadRequest::default()
            })
            .unwrap();
        let ids: Vec<&str> = corpus.papers().iter().map(|p| p.paper_id()).collect();
        assert_eq!(ids, vec!["WBPaper00000001"]);

        let docs = corpus.papers()[0].text_docs(TextOptions::default()).unwrap();
        assert_eq!(
            docs,
            vec![
                "We crossed knownGene1 into the background.",
                "abcIs123 was bright.",
                "Strain list: xyEx7.",
            ]
        );
    }

    #[test]
    fn missing_text_is_reported_lazily() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut corpus = ManifestCorpus::open(&write_corpus(tmp.path())).unwrap();
        corpus
            .load(&LoadRequest {
                pap_types: Vec::new(),
                ..LoadRequest::default()
            })
            .unwrap();
        let review = corpus
            .papers()
            .iter()
            .find(|p| p.paper_id() == "WBPaper00000003")
            .unwrap();
        assert!(matches!(
            review.text_docs(TextOptions::default()),
            Err(CorpusError::TextRead { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let manifest = tmp.path().join("corpus.toml");
        std::fs::write(
            &manifest,
            "[[paper]]\nid = \"P1\"\ntext = \"a.txt\"\n[[paper]]\nid = \"P1\"\ntext = \"b.txt\"\n",
        )
        .unwrap();
        assert!(matches!(
            ManifestCorpus::open(&manifest),
            Err(CorpusError::DuplicatePaper { .. })
        ));
    }

    #[test]
    fn bad_date_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let manifest = tmp.path().join("corpus.toml");
        std::fs::write(&manifest, "[[paper]]\nid = \"P1\"\nadded = \"soon\"\ntext = \"a.txt\"\n")
            .unwrap();
        assert!(matches!(
            ManifestCorpus::open(&manifest),
            Err(CorpusError::BadDate { .. })
        ));
    }
}
