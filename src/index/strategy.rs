// file: src/index/strategy.rs
// description: keyword, semantic and similarity scoring over a corpus snapshot
// reference: https://en.wikipedia.org/wiki/Tf%E2%80%93idf

use super::snapshot::CorpusSnapshot;
use crate::embedding::{Embedder, cosine};
use crate::error::{Result, XplorerError};
use crate::models::{PaperId, SearchMethod};
use crate::utils::text::{normalize_phrase, tokenize};
use crate::utils::with_deadline;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const EXACT_TITLE_BOOST: f32 = 20.0;
const TITLE_PHRASE_BOOST: f32 = 10.0;
const AUTHOR_PHRASE_BOOST: f32 = 5.0;

/// Scores the candidate entries (positions in the snapshot) for one query.
/// Ordering, ties and pagination are handled by the caller.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    fn method(&self) -> SearchMethod;

    /// Time spent in the embedding backend, granted on top of the lookup
    /// deadline.
    fn embedding_budget(&self) -> Duration {
        Duration::ZERO
    }

    async fn score(
        &self,
        snapshot: &CorpusSnapshot,
        query: &str,
        candidates: &[usize],
    ) -> Result<Vec<(usize, f32)>>;
}

/// Weighted tf-idf over title, author and abstract terms. Query words that
/// are not indexed fall back to indexed terms they prefix. A query matching a
/// title or an author name as a whole phrase gets a boost on top.
pub struct KeywordStrategy;

impl KeywordStrategy {
    fn phrase_boost(snapshot: &CorpusSnapshot, position: usize, phrase: &str) -> f32 {
        if phrase.is_empty() {
            return 0.0;
        }

        let mut boost = 0.0;
        let title = snapshot.normalized_title(position);
        if title == phrase {
            boost += EXACT_TITLE_BOOST;
        } else if contains_phrase(title, phrase) {
            boost += TITLE_PHRASE_BOOST;
        }

        if snapshot
            .normalized_authors(position)
            .iter()
            .any(|author| contains_phrase(author, phrase))
        {
            boost += AUTHOR_PHRASE_BOOST;
        }

        boost
    }
}

/// Whole-word containment of `phrase` in `text`, both already normalized.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    format!(" {} ", text).contains(&format!(" {} ", phrase))
}

#[async_trait]
impl SearchStrategy for KeywordStrategy {
    fn method(&self) -> SearchMethod {
        SearchMethod::Keyword
    }

    async fn score(
        &self,
        snapshot: &CorpusSnapshot,
        query: &str,
        candidates: &[usize],
    ) -> Result<Vec<(usize, f32)>> {
        let tokens = tokenize(query);
        let phrase = normalize_phrase(query);
        let total = snapshot.len().max(1) as f32;
        let mut scores: HashMap<usize, f32> = candidates.iter().map(|&c| (c, 0.0)).collect();

        for token in &tokens {
            let terms: Vec<&str> = if snapshot.postings(token).is_some() {
                vec![token.as_str()]
            } else {
                snapshot.terms_with_prefix(token).collect()
            };

            for term in terms {
                let Some(postings) = snapshot.postings(term) else {
                    continue;
                };
                let idf = (1.0 + total / snapshot.document_frequency(postings) as f32).ln();

                for posting in postings {
                    if let Some(score) = scores.get_mut(&posting.entry) {
                        let tf = 1.0 + (posting.term_frequency as f32).ln();
                        *score += posting.field.weight() * tf * idf;
                    }
                }
            }
        }

        for (position, score) in scores.iter_mut() {
            *score += Self::phrase_boost(snapshot, *position, &phrase);
        }

        Ok(scores.into_iter().filter(|(_, score)| *score > 0.0).collect())
    }
}

/// Cosine similarity between the query embedding and each title plus
/// abstract embedding.
pub struct SemanticStrategy {
    embedder: Arc<dyn Embedder>,
    embed_timeout: Duration,
}

impl SemanticStrategy {
    pub fn new(embedder: Arc<dyn Embedder>, embed_timeout: Duration) -> Self {
        Self {
            embedder,
            embed_timeout,
        }
    }
}

#[async_trait]
impl SearchStrategy for SemanticStrategy {
    fn method(&self) -> SearchMethod {
        SearchMethod::Semantic
    }

    fn embedding_budget(&self) -> Duration {
        self.embed_timeout
    }

    async fn score(
        &self,
        snapshot: &CorpusSnapshot,
        query: &str,
        candidates: &[usize],
    ) -> Result<Vec<(usize, f32)>> {
        let query_vector =
            with_deadline("embedding query", self.embed_timeout, self.embedder.embed(query))
                .await?;
        Ok(candidates
            .iter()
            .map(|&c| (c, cosine(&query_vector, &snapshot.entry(c).embedding)))
            .collect())
    }
}

/// The query is a paper id; every other candidate is scored against that
/// paper's stored embedding.
pub struct SimilarityStrategy;

#[async_trait]
impl SearchStrategy for SimilarityStrategy {
    fn method(&self) -> SearchMethod {
        SearchMethod::Similarity
    }

    async fn score(
        &self,
        snapshot: &CorpusSnapshot,
        query: &str,
        candidates: &[usize],
    ) -> Result<Vec<(usize, f32)>> {
        let id = PaperId::parse(query)?;
        let target = snapshot
            .position(&id)
            .ok_or_else(|| XplorerError::PaperNotFound(id.to_string()))?;
        let target_vector = &snapshot.entry(target).embedding;

        Ok(candidates
            .iter()
            .filter(|&&c| c != target)
            .map(|&c| (c, cosine(target_vector, &snapshot.entry(c).embedding)))
            .collect())
    }
}
