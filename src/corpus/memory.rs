//! In-memory corpus built from strings.

use chrono::NaiveDate;

use super::{Corpus, CorpusResult, LoadRequest, Paper, PaperMeta, TextOptions};

/// A paper whose text is held in memory, already split into sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPaper {
    meta: PaperMeta,
    sentences: Vec<String>,
    supplemental: Vec<String>,
}

impl MemoryPaper {
    pub fn new<I, S>(id: impl Into<String>, sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            meta: PaperMeta::new(id),
            sentences: sentences.into_iter().map(Into::into).collect(),
            supplemental: Vec::new(),
        }
    }

    pub fn with_supplemental<I, S>(mut self, sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supplemental = sentences.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_added(mut self, added: NaiveDate) -> Self {
        self.meta.added = Some(added);
        self
    }

    pub fn with_pap_type(mut self, pap_type: impl Into<String>) -> Self {
        self.meta.pap_type = pap_type.into();
        self
    }

    pub fn temp_pdf(mut self) -> Self {
        self.meta.temp_pdf = true;
        self
    }

    pub fn meta(&self) -> &PaperMeta {
        &self.meta
    }
}

impl Paper for MemoryPaper {
    fn paper_id(&self) -> &str {
        &self.meta.id
    }

    fn text_docs(&self, options: TextOptions) -> CorpusResult<Vec<String>> {
        let mut docs: Vec<&String> = self.sentences.iter().collect();
        if options.include_supplemental {
            docs.extend(self.supplemental.iter());
        }
        let mut out = Vec::with_capacity(docs.len());
        if options.split_sentences {
            for sentence in docs {
                if options.lowercase {
                    out.push(sentence.to_lowercase());
                } else {
                    out.push(sentence.clone());
                }
            }
        } else {
            let joined = docs
                .into_iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            options.shape(&joined, &mut out);
        }
        Ok(out)
    }
}

/// A corpus over a fixed list of [`MemoryPaper`]s.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    available: Vec<MemoryPaper>,
    loaded: Vec<MemoryPaper>,
}

impl MemoryCorpus {
    pub fn new(papers: impl IntoIterator<Item = MemoryPaper>) -> Self {
        Self {
            available: papers.into_iter().collect(),
            loaded: Vec::new(),
        }
    }
}

impl Corpus for MemoryCorpus {
    type Paper = MemoryPaper;

    fn load(&mut self, request: &LoadRequest) -> CorpusResult<()> {
        self.loaded = request.select(self.available.iter().cloned(), MemoryPaper::meta);
        Ok(())
    }

    fn papers(&self) -> &[MemoryPaper] {
        &self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplemental_is_optional() {
        let paper = MemoryPaper::new("P1", ["Main text."]).with_supplemental(["Supp abcIs1."]);
        assert_eq!(paper.text_docs(TextOptions::default()).unwrap().len(), 2);
        let main_only = TextOptions {
            include_supplemental: false,
            ..TextOptions::default()
        };
        assert_eq!(paper.text_docs(main_only).unwrap(), vec!["Main text."]);
    }

    #[test]
    fn load_applies_request() {
        let mut corpus = MemoryCorpus::new([
            MemoryPaper::new("P2", ["b"]),
            MemoryPaper::new("P1", ["a"]),
            MemoryPaper::new("P3", ["c"]).temp_pdf(),
        ]);
        corpus.load(&LoadRequest::default()).unwrap();
        let ids: Vec<&str> = corpus.papers().iter().map(|p| p.paper_id()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }
}
