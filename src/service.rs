// file: src/service.rs
// description: query router dispatching requests to the corpus index or a paper's navigator, chunker and resolvers
// reference: application orchestration

use crate::chunker::Chunker;
use crate::config::Config;
use crate::embedding::build_embedder;
use crate::error::{Result, XplorerError};
use crate::index::{CorpusIndex, CorpusSnapshot, SnapshotStore};
use crate::models::{
    FigureView, PaperId, PaperMetadata, PaperSummary, SearchMethod, SectionAddress, SectionView,
};
use crate::navigator::SectionNavigator;
use crate::parser::DocumentParser;
use crate::pipeline::{Ingestor, PipelineStats};
use crate::resolver::{CitationResolver, FigureResolver};
use crate::store::{CachedPaper, DirectorySource, DocumentStore};
use crate::utils::Validator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub papers_indexed: usize,
    pub embedding_model: String,
    pub snapshot_built_at: String,
    pub cached_documents: usize,
    pub documents_parsed: usize,
}

pub struct XplorerService {
    config: Config,
    source: Arc<DirectorySource>,
    store: DocumentStore,
    index: CorpusIndex,
    chunker: Chunker,
    ingestor: Ingestor,
    snapshots: SnapshotStore,
}

impl XplorerService {
    /// Wires every component with an empty corpus; see [`XplorerService::open`].
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let source = Arc::new(DirectorySource::open(
            &config.corpus.source_dir,
            config.pipeline.clone(),
        )?);
        let parser = Arc::new(DocumentParser::new(&config.corpus.asset_base_url));
        let embedder = build_embedder(&config.embedding)?;

        let embed_timeout = Duration::from_millis(config.embedding.timeout_ms);
        let lookup_timeout = Duration::from_millis(config.search.lookup_timeout_ms);

        let store = DocumentStore::new(
            source.clone(),
            parser.clone(),
            config.store.cache_capacity,
            lookup_timeout,
        );
        let index = CorpusIndex::new(
            CorpusSnapshot::empty(embedder.model_name()),
            embedder.clone(),
            lookup_timeout,
            embed_timeout,
            config.search.snippet_words,
        );
        let chunker = Chunker::new(embedder.clone(), embed_timeout, config.embedding.batch_size);
        let ingestor = Ingestor::new(
            source.clone(),
            parser,
            embedder,
            config.pipeline.parallel_workers,
            config.embedding.batch_size,
            embed_timeout,
        );
        let snapshots = SnapshotStore::new(config.corpus.snapshot_path.clone());

        Ok(Self {
            config,
            source,
            store,
            index,
            chunker,
            ingestor,
            snapshots,
        })
    }

    /// Loads the saved snapshot, ingesting the source directory when none exists.
    pub async fn open(config: Config) -> Result<Self> {
        let service = Self::from_config(config)?;
        service.load_or_ingest().await?;
        Ok(service)
    }

    /// Makes the corpus searchable: the saved snapshot if there is one, a
    /// fresh ingestion otherwise. A snapshot from another embedding model is
    /// an error here; `ingest` is the way to replace it.
    pub async fn load_or_ingest(&self) -> Result<()> {
        if !self.restore().await? {
            info!("No corpus snapshot yet, ingesting {:?}", self.source.root());
            self.reindex(false).await?;
        }
        Ok(())
    }

    /// Explicit re-ingestion. Vectors from the saved snapshot are reused when
    /// it was built with the configured model; a snapshot from another model
    /// is ignored and overwritten.
    pub async fn ingest(&self, show_progress: bool) -> Result<PipelineStats> {
        match self.restore().await {
            Ok(true) => {}
            Ok(false) => info!("No previous snapshot, computing every embedding"),
            Err(XplorerError::Config(reason)) => {
                warn!("Ignoring saved snapshot: {}", reason);
            }
            Err(e) => return Err(e),
        }
        self.reindex(show_progress).await
    }

    /// Swaps in the persisted snapshot if one exists.
    pub async fn restore(&self) -> Result<bool> {
        match self.snapshots.load(&self.config.embedding.model).await? {
            Some(snapshot) => {
                info!("Loaded corpus snapshot with {} papers", snapshot.len());
                self.index.swap(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rebuilds the corpus from the source directory, persists it and swaps
    /// it in. Cached documents whose source changed are dropped.
    pub async fn reindex(&self, show_progress: bool) -> Result<PipelineStats> {
        self.source.rescan()?;
        let previous = self.index.current();
        let outcome = self.ingestor.run(Some(previous.as_ref()), show_progress).await?;

        self.snapshots.save(&outcome.snapshot).await?;
        for id in &outcome.changed {
            self.store.invalidate(id);
        }
        self.index.swap(outcome.snapshot);

        Ok(outcome.stats)
    }

    pub async fn search(
        &self,
        query: &str,
        method: SearchMethod,
        count: Option<usize>,
        page: Option<usize>,
        year: Option<i32>,
    ) -> Result<Vec<PaperSummary>> {
        let count = count.unwrap_or(self.config.search.default_count);
        let page = page.unwrap_or(1);
        Validator::validate_query(query)?;
        Validator::validate_count(count, self.config.search.max_count)?;
        Validator::validate_page(page)?;
        if let Some(year) = year {
            Validator::validate_year(year)?;
        }

        self.index.search(query, method, count, page, year).await
    }

    pub async fn read_paper_metadata(
        &self,
        paper_id: &str,
        show_abstract: bool,
    ) -> Result<PaperMetadata> {
        let paper = self.paper(paper_id).await?;
        let document = &paper.document;

        Ok(PaperMetadata {
            id: document.id.to_string(),
            title: document.title.clone(),
            date: document.date.map(|d| d.format("%Y-%m-%d").to_string()),
            authors: document.authors.clone(),
            abstract_text: (show_abstract && !document.abstract_text.is_empty())
                .then(|| document.abstract_text.clone()),
            table_of_contents: SectionNavigator::new(document).table_of_contents(),
            can_read_citation: document.can_read_citation,
            num_figures: document.num_figures(),
        })
    }

    pub async fn read_section(
        &self,
        paper_id: &str,
        section: &SectionAddress,
    ) -> Result<SectionView> {
        let paper = self.paper(paper_id).await?;
        SectionNavigator::new(&paper.document).read(section)
    }

    pub async fn chunk_search(
        &self,
        paper_id: &str,
        query: &str,
        count: Option<usize>,
        page: Option<usize>,
    ) -> Result<Vec<String>> {
        let count = count.unwrap_or(self.config.search.chunk_count);
        let page = page.unwrap_or(1);
        Validator::validate_query(query)?;
        Validator::validate_count(count, self.config.search.max_count)?;
        Validator::validate_page(page)?;

        let paper = self.paper(paper_id).await?;
        let chunks = paper.chunk_index(&self.chunker).await?;
        self.chunker.search(&chunks, query, count, page).await
    }

    pub async fn read_citation(&self, paper_id: &str, citation: &str) -> Result<String> {
        let paper = self.paper(paper_id).await?;
        CitationResolver::resolve(&paper.document, citation)
    }

    pub async fn get_figure(&self, paper_id: &str, figure_id: &str) -> Result<FigureView> {
        let paper = self.paper(paper_id).await?;
        FigureResolver::resolve(&paper.document, figure_id)
    }

    pub fn stats(&self) -> ServiceStats {
        let snapshot = self.index.current();
        ServiceStats {
            papers_indexed: snapshot.len(),
            embedding_model: snapshot.model().to_string(),
            snapshot_built_at: snapshot.built_at().to_rfc3339(),
            cached_documents: self.store.cached_count(),
            documents_parsed: self.store.parse_count(),
        }
    }

    async fn paper(&self, raw_id: &str) -> Result<Arc<CachedPaper>> {
        let id = PaperId::parse(raw_id)?;
        self.store.get(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn service() -> (XplorerService, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default_config();
        config.corpus.source_dir =
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/papers"));
        config.corpus.snapshot_path = temp.path().join("snapshot.json");
        let service = XplorerService::open(config).await.unwrap();
        (service, temp)
    }

    #[tokio::test]
    async fn test_keyword_search_finds_title() {
        let (service, _temp) = service().await;
        let results = service
            .search("Attention Is All You Need", SearchMethod::Keyword, Some(3), None, None)
            .await
            .unwrap();

        assert!(!results.is_empty() && results.len() <= 3);
        assert_eq!(results[0].id, "1706.03762");
        assert_eq!(results[0].first_author.as_deref(), Some("Ashish Vaswani"));
    }

    #[tokio::test]
    async fn test_read_nested_section_has_citation_marker() {
        let (service, _temp) = service().await;
        let metadata = service.read_paper_metadata("1706.03762", true).await.unwrap();
        let third_first_child = metadata
            .table_of_contents
            .lines()
            .find(|l| l.trim_start().starts_with("3.1. "))
            .unwrap()
            .to_string();

        let section = service
            .read_section("1706.03762", &SectionAddress::Path(vec![3, 1]))
            .await
            .unwrap();

        assert!(third_first_child.contains(&format!("3.1. {} (", section.title)));
        assert!(section.text.contains("<cit. "));
        assert_eq!(
            section,
            service
                .read_section("1706.03762", &SectionAddress::Path(vec![3, 1]))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_parent_section_contains_children() {
        let (service, _temp) = service().await;
        let parent = service
            .read_section("1706.03762", &SectionAddress::TopLevel(3))
            .await
            .unwrap();
        let first = service
            .read_section("1706.03762", &SectionAddress::Path(vec![3, 1]))
            .await
            .unwrap();
        let second = service
            .read_section("1706.03762", &SectionAddress::Path(vec![3, 2]))
            .await
            .unwrap();

        let first_at = parent.text.find(&first.text).unwrap();
        let second_at = parent.text.find(&second.text).unwrap();
        assert!(first_at < second_at);
        assert!(parent.figures.len() >= second.figures.len());
    }

    #[tokio::test]
    async fn test_chunk_search_returns_requested_count() {
        let (service, _temp) = service().await;
        let two = service
            .chunk_search("quant-ph/9802065", "Shor's algorithm", Some(2), Some(1))
            .await
            .unwrap();
        let four = service
            .chunk_search("quant-ph/9802065", "Shor's algorithm", Some(4), Some(1))
            .await
            .unwrap();

        assert_eq!(two.len(), 2);
        assert_eq!(two[..], four[..2]);

        // Sections 1, 3 and 5 are the only ones naming the algorithm; they
        // must outrank every other passage.
        assert!(four[..3].iter().all(|c| c.contains("Shor's algorithm")));
        assert!(!four[3].contains("Shor's algorithm"));

        let far = service
            .chunk_search("quant-ph/9802065", "Shor's algorithm", Some(2), Some(500))
            .await
            .unwrap();
        assert!(far.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_figure_is_not_found() {
        let (service, _temp) = service().await;
        assert!(matches!(
            service.get_figure("1706.03762", "demo").await,
            Err(XplorerError::FigureNotFound { .. })
        ));

        let figure = service.get_figure("1706.03762", "attention").await.unwrap();
        assert_eq!(figure.caption.lines().count(), 2);
        assert!(figure.url.iter().all(|u| u.contains("/1706_03762/")));
    }

    #[tokio::test]
    async fn test_citations_follow_capability_flag() {
        let (service, _temp) = service().await;

        let shor = service.read_paper_metadata("quant-ph/9802065", false).await.unwrap();
        assert!(!shor.can_read_citation);
        assert!(shor.abstract_text.is_none());
        for marker in ["1", "<cit. 2>", "anything"] {
            assert!(matches!(
                service.read_citation("quant-ph/9802065", marker).await,
                Err(XplorerError::CitationUnsupported(_))
            ));
        }

        let attention = service.read_paper_metadata("1706.03762", false).await.unwrap();
        assert!(attention.can_read_citation);
        assert!(
            service
                .read_citation("1706.03762", "<cit. ba2016layer>")
                .await
                .unwrap()
                .contains("Layer normalization")
        );
        assert!(matches!(
            service.read_citation("1706.03762", "missing2020").await,
            Err(XplorerError::CitationNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_paper_fails_everywhere() {
        let (service, _temp) = service().await;
        let address = SectionAddress::TopLevel(1);

        assert!(matches!(
            service.read_paper_metadata("2401.00001", true).await,
            Err(XplorerError::PaperNotFound(_))
        ));
        assert!(matches!(
            service.read_section("2401.00001", &address).await,
            Err(XplorerError::PaperNotFound(_))
        ));
        assert!(matches!(
            service.chunk_search("2401.00001", "q", None, None).await,
            Err(XplorerError::PaperNotFound(_))
        ));
        assert!(matches!(
            service.read_citation("not-a-paper", "x").await,
            Err(XplorerError::PaperNotFound(_))
        ));
        assert!(matches!(
            service.get_figure("2401.00001", "x").await,
            Err(XplorerError::PaperNotFound(_))
        ));
        assert!(matches!(
            service.search("2401.00001", SearchMethod::Similarity, None, None, None).await,
            Err(XplorerError::PaperNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_similarity_excludes_query_paper() {
        let (service, _temp) = service().await;
        let results = service
            .search("1706.03762", SearchMethod::Similarity, Some(10), None, None)
            .await
            .unwrap();

        assert_eq!(results.len(), service.stats().papers_indexed - 1);
        assert!(results.iter().all(|r| r.id != "1706.03762"));
    }

    #[tokio::test]
    async fn test_semantic_pages_and_year_filter() {
        let (service, _temp) = service().await;
        let first = service
            .search("deep neural networks", SearchMethod::Semantic, Some(2), Some(1), None)
            .await
            .unwrap();
        let second = service
            .search("deep neural networks", SearchMethod::Semantic, Some(2), Some(2), None)
            .await
            .unwrap();
        assert!(first.iter().all(|r| !second.contains(r)));

        let in_2017 = service
            .search("attention", SearchMethod::Semantic, Some(10), None, Some(2017))
            .await
            .unwrap();
        let ids: Vec<&str> = in_2017.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1706.03762"]);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let (service, _temp) = service().await;
        assert!(matches!(
            service.read_section("1706.03762", &SectionAddress::Path(vec![])).await,
            Err(XplorerError::InvalidAddress(_))
        ));
        assert!(matches!(
            service.read_section("1706.03762", &SectionAddress::Path(vec![3, 99])).await,
            Err(XplorerError::SectionNotFound { .. })
        ));
        assert!(matches!(
            service.search("x", SearchMethod::Keyword, Some(0), None, None).await,
            Err(XplorerError::Validation(_))
        ));
        assert!(matches!(
            service.search("x", SearchMethod::Keyword, None, Some(0), None).await,
            Err(XplorerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reopen_loads_saved_snapshot() {
        let (service, temp) = service().await;
        let indexed = service.stats().papers_indexed;
        assert!(temp.path().join("snapshot.json").exists());

        let reopened = XplorerService::open(service.config().clone()).await.unwrap();
        assert_eq!(reopened.stats().papers_indexed, indexed);
        assert_eq!(reopened.stats().documents_parsed, 0);
    }

    #[tokio::test]
    async fn test_ingest_replaces_snapshot_from_other_model() {
        let (service, _temp) = service().await;
        let indexed = service.stats().papers_indexed;
        assert_eq!(service.stats().embedding_model, "hashed-bow-v1");

        let mut config = service.config().clone();
        config.embedding.model = "hashed-bow-v2".to_string();

        let refused = XplorerService::open(config.clone()).await;
        assert!(matches!(refused, Err(XplorerError::Config(_))));

        let switched = XplorerService::from_config(config.clone()).unwrap();
        let stats = switched.ingest(false).await.unwrap();
        assert_eq!(stats.papers_failed, 0);
        assert_eq!(switched.stats().embedding_model, "hashed-bow-v2");
        assert_eq!(switched.stats().papers_indexed, indexed);

        let reopened = XplorerService::open(config).await.unwrap();
        assert_eq!(reopened.stats().embedding_model, "hashed-bow-v2");
        assert_eq!(reopened.stats().papers_indexed, indexed);
    }
}
