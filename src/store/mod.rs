// file: src/store/mod.rs
// description: parsed document cache with per-paper parse coalescing and LRU eviction
// reference: https://docs.rs/dashmap, https://docs.rs/tokio/latest/tokio/sync/struct.OnceCell.html

pub mod source;

pub use source::{DirectorySource, PaperSource, ScannedFile, SourceProvider, compute_hash};

use crate::chunker::{ChunkIndex, Chunker};
use crate::error::{Result, XplorerError};
use crate::models::{Document, PaperId};
use crate::parser::DocumentParser;
use crate::utils::{OperationTimer, with_deadline};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// A parsed paper plus its lazily built chunk index.
pub struct CachedPaper {
    pub document: Arc<Document>,
    chunks: OnceCell<Arc<ChunkIndex>>,
}

impl CachedPaper {
    pub fn new(document: Document) -> Self {
        Self {
            document: Arc::new(document),
            chunks: OnceCell::new(),
        }
    }

    /// Chunks and embeds on first use; concurrent first calls share one build.
    pub async fn chunk_index(&self, chunker: &Chunker) -> Result<Arc<ChunkIndex>> {
        self.chunks
            .get_or_try_init(|| async { chunker.build(&self.document).await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }
}

struct Slot {
    paper: OnceCell<Arc<CachedPaper>>,
    last_access: AtomicU64,
}

impl Slot {
    fn new() -> Self {
        Self {
            paper: OnceCell::new(),
            last_access: AtomicU64::new(0),
        }
    }
}

/// One slot per paper id. The first caller for an id runs the fetch and
/// parse inside the slot's `OnceCell`; concurrent callers await the same
/// cell, so unrelated papers never wait on each other.
pub struct DocumentStore {
    source: Arc<dyn SourceProvider>,
    parser: Arc<DocumentParser>,
    slots: DashMap<PaperId, Arc<Slot>>,
    capacity: usize,
    load_timeout: Duration,
    clock: AtomicU64,
    parses: AtomicUsize,
}

impl DocumentStore {
    pub fn new(
        source: Arc<dyn SourceProvider>,
        parser: Arc<DocumentParser>,
        capacity: usize,
        load_timeout: Duration,
    ) -> Self {
        Self {
            source,
            parser,
            slots: DashMap::new(),
            capacity: capacity.max(1),
            load_timeout,
            clock: AtomicU64::new(0),
            parses: AtomicUsize::new(0),
        }
    }

    pub async fn get(&self, id: &PaperId) -> Result<Arc<CachedPaper>> {
        let slot = self
            .slots
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Slot::new()))
            .value()
            .clone();
        slot.last_access
            .store(self.clock.fetch_add(1, Ordering::Relaxed) + 1, Ordering::Relaxed);

        let loaded = slot
            .paper
            .get_or_try_init(|| self.load(id))
            .await
            .map(Arc::clone);

        match loaded {
            Ok(paper) => {
                self.evict_overflow(id);
                Ok(paper)
            }
            Err(e) => {
                self.slots
                    .remove_if(id, |_, s| Arc::ptr_eq(s, &slot) && !s.paper.initialized());
                Err(e)
            }
        }
    }

    /// Drops the cached parse; the next `get` parses the current source.
    pub fn invalidate(&self, id: &PaperId) -> bool {
        let removed = self.slots.remove(id).is_some();
        if removed {
            debug!("Invalidated cached document {}", id);
        }
        removed
    }

    pub fn contains(&self, id: &PaperId) -> bool {
        self.slots
            .get(id)
            .map(|slot| slot.paper.initialized())
            .unwrap_or(false)
    }

    pub fn cached_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().paper.initialized())
            .count()
    }

    /// Number of parses performed since creation.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    /// Only the fetch is bounded. Once a parse starts it runs to completion
    /// inside the slot, so a caller retrying after a timeout never starts a
    /// second parse of the same paper.
    async fn load(&self, id: &PaperId) -> Result<Arc<CachedPaper>> {
        let timer = OperationTimer::new(&format!("load {}", id));
        let source =
            with_deadline("fetching paper", self.load_timeout, self.source.fetch(id)).await?;
        self.parses.fetch_add(1, Ordering::SeqCst);

        let parser = Arc::clone(&self.parser);
        let document = tokio::task::spawn_blocking(move || {
            parser.parse(&source.id, &source.content, source.kind)
        })
        .await
        .map_err(|e| XplorerError::Unavailable(format!("parse task for {} failed: {}", id, e)))?;

        info!(
            "Parsed {} ({} sections, {} figures)",
            id,
            document.sections.len() - 1,
            document.num_figures()
        );
        timer.finish();
        Ok(Arc::new(CachedPaper::new(document)))
    }

    fn evict_overflow(&self, keep: &PaperId) {
        while self.cached_count() > self.capacity {
            let victim = self
                .slots
                .iter()
                .filter(|entry| entry.key() != keep && entry.value().paper.initialized())
                .min_by_key(|entry| entry.value().last_access.load(Ordering::Relaxed))
                .map(|entry| entry.key().clone());

            match victim {
                Some(victim) => {
                    self.slots.remove(&victim);
                    debug!("Evicted {} from document cache", victim);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use async_trait::async_trait;
    use futures::future::join_all;

    struct SlowSource {
        fetches: AtomicUsize,
        delay: Duration,
    }

    impl SlowSource {
        fn new(delay: Duration) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl SourceProvider for SlowSource {
        async fn fetch(&self, id: &PaperId) -> Result<PaperSource> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if id.as_str().starts_with("9999") {
                return Err(XplorerError::PaperNotFound(id.to_string()));
            }
            Ok(PaperSource::new(
                id.clone(),
                SourceKind::Markdown,
                format!("---\ntitle: Paper {}\n---\n# Intro\n\nSome text.", id),
            ))
        }

        async fn list(&self) -> Result<Vec<PaperId>> {
            Ok(Vec::new())
        }
    }

    /// Returns its content immediately; parse time dominates.
    struct FixedSource {
        content: String,
    }

    #[async_trait]
    impl SourceProvider for FixedSource {
        async fn fetch(&self, id: &PaperId) -> Result<PaperSource> {
            Ok(PaperSource::new(id.clone(), SourceKind::Markdown, self.content.clone()))
        }

        async fn list(&self) -> Result<Vec<PaperId>> {
            Ok(Vec::new())
        }
    }

    fn store(source: Arc<SlowSource>, capacity: usize, timeout: Duration) -> DocumentStore {
        DocumentStore::new(
            source,
            Arc::new(DocumentParser::new("https://assets.example.org")),
            capacity,
            timeout,
        )
    }

    fn id(raw: &str) -> PaperId {
        PaperId::parse(raw).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_coalesce_into_one_parse() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(50)));
        let store = Arc::new(store(Arc::clone(&source), 4, Duration::from_secs(5)));
        let paper = id("1706.03762");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let paper = paper.clone();
                tokio::spawn(async move { store.get(&paper).await })
            })
            .collect();

        let results: Vec<Arc<CachedPaper>> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.parse_count(), 1);
        assert!(results.iter().all(|p| Arc::ptr_eq(p, &results[0])));
        assert_eq!(results[0].document.title, "Paper 1706.03762");
    }

    #[tokio::test]
    async fn test_different_papers_parse_independently() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(10)));
        let store = store(Arc::clone(&source), 4, Duration::from_secs(5));

        let (first, second) = (id("1706.03762"), id("1810.04805"));
        let (a, b) = tokio::join!(store.get(&first), store.get(&second));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(store.parse_count(), 2);
        assert_eq!(store.cached_count(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(1)));
        let store = store(Arc::clone(&source), 4, Duration::from_secs(5));
        let missing = id("9999.00001");

        assert!(matches!(
            store.get(&missing).await,
            Err(XplorerError::PaperNotFound(_))
        ));
        assert!(!store.contains(&missing));
        assert!(store.get(&missing).await.is_err());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lru_eviction_and_invalidate() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(1)));
        let store = store(Arc::clone(&source), 2, Duration::from_secs(5));
        let (a, b, c) = (id("1706.03762"), id("1810.04805"), id("1512.03385"));

        store.get(&a).await.unwrap();
        store.get(&b).await.unwrap();
        store.get(&a).await.unwrap();
        store.get(&c).await.unwrap();

        assert_eq!(store.cached_count(), 2);
        assert!(store.contains(&a));
        assert!(!store.contains(&b));
        assert!(store.contains(&c));

        assert!(store.invalidate(&a));
        store.get(&a).await.unwrap();
        assert_eq!(store.parse_count(), 4);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_as_unavailable() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(200)));
        let store = store(Arc::clone(&source), 2, Duration::from_millis(20));

        let err = store.get(&id("1706.03762")).await.err().unwrap();
        assert!(err.is_retriable());
        assert_eq!(store.cached_count(), 0);
        assert_eq!(store.parse_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_parse_is_not_cut_short_by_fetch_deadline() {
        // 300 sections keep the parse busy well past the fetch deadline.
        let body: String = (1..=300)
            .map(|n| format!("## Section {n}\n\n{}\n\n", "word ".repeat(200)))
            .collect();
        let source = Arc::new(FixedSource {
            content: format!("---\ntitle: Long\n---\n{body}"),
        });
        let store = Arc::new(DocumentStore::new(
            source,
            Arc::new(DocumentParser::new("https://assets.example.org")),
            2,
            Duration::from_millis(1),
        ));
        let paper = id("1706.03762");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let paper = paper.clone();
                tokio::spawn(async move { store.get(&paper).await })
            })
            .collect();
        for handle in join_all(handles).await {
            assert_eq!(handle.unwrap().unwrap().document.sections.len(), 301);
        }
        assert_eq!(store.parse_count(), 1);
    }
}
