// file: src/index/mod.rs
// description: corpus-wide search over an atomically swapped snapshot
// reference: internal module structure

pub mod persistence;
pub mod snapshot;
pub mod strategy;

pub use persistence::SnapshotStore;
pub use snapshot::{CorpusEntry, CorpusSnapshot, Field, Posting, SnapshotFile};
pub use strategy::{KeywordStrategy, SearchStrategy, SemanticStrategy, SimilarityStrategy};

use crate::embedding::Embedder;
use crate::error::{Result, XplorerError};
use crate::models::{PaperSummary, SearchMethod};
use crate::utils::{OperationTimer, paginate, with_deadline};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

/// Queries clone the current `Arc<CorpusSnapshot>` and run against it, so a
/// concurrent `swap` never exposes a half-built index.
pub struct CorpusIndex {
    snapshot: RwLock<Arc<CorpusSnapshot>>,
    strategies: HashMap<SearchMethod, Box<dyn SearchStrategy>>,
    timeout: Duration,
    snippet_words: usize,
}

impl CorpusIndex {
    /// `timeout` bounds a lookup; `embed_timeout` bounds the query embedding
    /// of a semantic search and is added to the lookup deadline.
    pub fn new(
        snapshot: CorpusSnapshot,
        embedder: Arc<dyn Embedder>,
        timeout: Duration,
        embed_timeout: Duration,
        snippet_words: usize,
    ) -> Self {
        let strategies: Vec<Box<dyn SearchStrategy>> = vec![
            Box::new(KeywordStrategy),
            Box::new(SemanticStrategy::new(embedder, embed_timeout)),
            Box::new(SimilarityStrategy),
        ];

        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            strategies: strategies.into_iter().map(|s| (s.method(), s)).collect(),
            timeout,
            snippet_words,
        }
    }

    pub fn current(&self) -> Arc<CorpusSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the snapshot; returns the one it replaced.
    pub fn swap(&self, next: CorpusSnapshot) -> Arc<CorpusSnapshot> {
        let next = Arc::new(next);
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        info!(
            "Swapping corpus snapshot: {} -> {} papers",
            guard.len(),
            next.len()
        );
        std::mem::replace(&mut *guard, next)
    }

    /// Year filter first, then scoring, then ordering by score, newer date
    /// and id, then the requested 1-indexed page.
    pub async fn search(
        &self,
        query: &str,
        method: SearchMethod,
        count: usize,
        page: usize,
        year: Option<i32>,
    ) -> Result<Vec<PaperSummary>> {
        let timer = OperationTimer::new(&format!("{} search", method));
        let snapshot = self.current();
        let strategy = self
            .strategies
            .get(&method)
            .ok_or_else(|| XplorerError::Validation(format!("no strategy for {}", method)))?;

        let candidates: Vec<usize> = (0..snapshot.len())
            .filter(|&i| year.is_none_or(|y| snapshot.entry(i).year() == Some(y)))
            .collect();

        let mut scored = with_deadline(
            &format!("{} search", method),
            self.timeout + strategy.embedding_budget(),
            strategy.score(&snapshot, query, &candidates),
        )
        .await?;

        scored.sort_by(|a, b| {
            let (left, right) = (snapshot.entry(a.0), snapshot.entry(b.0));
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| right.date.cmp(&left.date))
                .then_with(|| left.id.cmp(&right.id))
        });

        debug!(
            "{} search for '{}' matched {} of {} candidates",
            method,
            query,
            scored.len(),
            candidates.len()
        );
        timer.finish();

        Ok(paginate(scored, count, page)
            .into_iter()
            .map(|(position, _)| snapshot.entry(position).summary(self.snippet_words))
            .collect())
    }
}
