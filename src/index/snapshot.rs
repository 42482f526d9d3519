// file: src/index/snapshot.rs
// description: immutable corpus snapshot with entries, id lookup and inverted term index
// reference: https://en.wikipedia.org/wiki/Inverted_index

use crate::models::{PaperId, PaperSummary};
use crate::utils::text::{normalize_phrase, snippet, tokenize};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One paper's corpus-level record. Rebuilt whole on re-ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: PaperId,
    pub title: String,
    pub authors: Vec<String>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub content_hash: String,
    /// Embedding of `title` and `abstract_text`.
    pub embedding: Vec<f32>,
}

impl CorpusEntry {
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Text that `embedding` is computed from.
    pub fn embedding_text(title: &str, abstract_text: &str) -> String {
        format!("{}\n{}", title, abstract_text)
    }

    pub fn summary(&self, snippet_words: usize) -> PaperSummary {
        PaperSummary {
            id: self.id.to_string(),
            title: self.title.clone(),
            first_author: self.first_author().map(str::to_string),
            date: self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            abstract_snippet: snippet(&self.abstract_text, snippet_words),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Abstract,
}

impl Field {
    pub fn weight(&self) -> f32 {
        match self {
            Self::Title => 3.0,
            Self::Author => 2.0,
            Self::Abstract => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub entry: usize,
    pub field: Field,
    pub term_frequency: u32,
}

/// On-disk form of a snapshot; the lookup structures are rebuilt on load.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub model: String,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<CorpusEntry>,
}

/// Never mutated after construction; re-ingestion builds a new one.
#[derive(Debug)]
pub struct CorpusSnapshot {
    model: String,
    built_at: DateTime<Utc>,
    entries: Vec<CorpusEntry>,
    by_id: HashMap<PaperId, usize>,
    postings: BTreeMap<String, Vec<Posting>>,
    titles: Vec<String>,
    authors: Vec<Vec<String>>,
}

impl CorpusSnapshot {
    pub fn new(model: &str, entries: Vec<CorpusEntry>) -> Self {
        Self::with_timestamp(model, Utc::now(), entries)
    }

    pub fn empty(model: &str) -> Self {
        Self::new(model, Vec::new())
    }

    pub fn from_file(file: SnapshotFile) -> Self {
        Self::with_timestamp(&file.model, file.built_at, file.entries)
    }

    pub fn to_file(&self) -> SnapshotFile {
        SnapshotFile {
            model: self.model.clone(),
            built_at: self.built_at,
            entries: self.entries.clone(),
        }
    }

    fn with_timestamp(model: &str, built_at: DateTime<Utc>, mut entries: Vec<CorpusEntry>) -> Self {
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries.dedup_by(|a, b| a.id == b.id);

        let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for (position, entry) in entries.iter().enumerate() {
            let author_text = entry.authors.join(" ");
            let fields = [
                (Field::Title, entry.title.as_str()),
                (Field::Author, author_text.as_str()),
                (Field::Abstract, entry.abstract_text.as_str()),
            ];

            for (field, text) in fields {
                let mut counts: HashMap<String, u32> = HashMap::new();
                for token in tokenize(text) {
                    *counts.entry(token).or_default() += 1;
                }
                for (term, term_frequency) in counts {
                    postings.entry(term).or_default().push(Posting {
                        entry: position,
                        field,
                        term_frequency,
                    });
                }
            }
        }

        let by_id = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let titles = entries.iter().map(|e| normalize_phrase(&e.title)).collect();
        let authors = entries
            .iter()
            .map(|e| e.authors.iter().map(|a| normalize_phrase(a)).collect())
            .collect();

        Self {
            model: model.to_string(),
            built_at,
            entries,
            by_id,
            postings,
            titles,
            authors,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn entry(&self, position: usize) -> &CorpusEntry {
        &self.entries[position]
    }

    pub fn position(&self, id: &PaperId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &PaperId) -> Option<&CorpusEntry> {
        self.position(id).map(|i| &self.entries[i])
    }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    /// Indexed terms starting with `prefix`, for partial-word queries.
    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.postings
            .range(prefix.to_string()..)
            .map(|(term, _)| term.as_str())
            .take_while(move |term| term.starts_with(prefix))
    }

    /// Number of distinct entries containing `term` in any field.
    pub fn document_frequency(&self, postings: &[Posting]) -> usize {
        let mut entries: Vec<usize> = postings.iter().map(|p| p.entry).collect();
        entries.sort_unstable();
        entries.dedup();
        entries.len()
    }

    pub fn normalized_title(&self, position: usize) -> &str {
        &self.titles[position]
    }

    pub fn normalized_authors(&self, position: usize) -> &[String] {
        &self.authors[position]
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::parse_date;

    pub fn entry(id: &str, title: &str, authors: &[&str], date: &str, abstract_text: &str) -> CorpusEntry {
        CorpusEntry {
            id: PaperId::parse(id).unwrap(),
            title: title.to_string(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            date: parse_date(date),
            abstract_text: abstract_text.to_string(),
            content_hash: format!("hash-{}", id),
            embedding: Vec::new(),
        }
    }
}
