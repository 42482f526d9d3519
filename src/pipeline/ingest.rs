// file: src/pipeline/ingest.rs
// description: batch ingestion from paper sources into a new corpus snapshot
// reference: orchestrates asynchronous ingestion workflow

use crate::embedding::Embedder;
use crate::error::{Result, XplorerError};
use crate::index::{CorpusEntry, CorpusSnapshot};
use crate::models::{Document, PaperId};
use crate::parser::DocumentParser;
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::store::SourceProvider;
use crate::utils::with_deadline;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

struct ParsedPaper {
    document: Document,
    content_hash: String,
    bytes: u64,
}

pub struct IngestOutcome {
    pub snapshot: CorpusSnapshot,
    pub stats: PipelineStats,
    /// Papers whose source changed or disappeared since the previous snapshot.
    pub changed: Vec<PaperId>,
}

pub struct Ingestor {
    source: Arc<dyn SourceProvider>,
    parser: Arc<DocumentParser>,
    embedder: Arc<dyn Embedder>,
    workers: usize,
    batch_size: usize,
    timeout: Duration,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn SourceProvider>,
        parser: Arc<DocumentParser>,
        embedder: Arc<dyn Embedder>,
        workers: usize,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            parser,
            embedder,
            workers: workers.max(1),
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    /// Parses every listed paper and embeds title plus abstract. Embeddings
    /// from `previous` are reused when the model and content hash match.
    /// Papers that fail to load are skipped; an embedding failure fails the run
    /// so the caller keeps its current snapshot.
    pub async fn run(
        &self,
        previous: Option<&CorpusSnapshot>,
        show_progress: bool,
    ) -> Result<IngestOutcome> {
        info!("Starting corpus ingestion");
        let ids = self.source.list().await?;
        info!("Found {} papers to ingest", ids.len());

        let progress = Arc::new(if show_progress {
            ProgressTracker::new(ids.len())
        } else {
            ProgressTracker::hidden(ids.len())
        });

        let mut parsed = self.parse_all(ids, Arc::clone(&progress)).await;
        parsed.sort_by(|a, b| a.document.id.cmp(&b.document.id));

        let reusable = previous.filter(|p| p.model() == self.embedder.model_name());
        let mut entries: Vec<CorpusEntry> = Vec::with_capacity(parsed.len());
        let mut pending: Vec<usize> = Vec::new();

        for paper in parsed {
            let document = paper.document;
            let reused = reusable
                .and_then(|snapshot| snapshot.get(&document.id))
                .filter(|e| e.content_hash == paper.content_hash && !e.embedding.is_empty())
                .map(|e| e.embedding.clone());

            match reused {
                Some(_) => progress.inc_papers_indexed(),
                None => pending.push(entries.len()),
            }

            entries.push(CorpusEntry {
                id: document.id,
                title: document.title,
                authors: document.authors,
                date: document.date,
                abstract_text: document.abstract_text,
                content_hash: paper.content_hash,
                embedding: reused.unwrap_or_default(),
            });
        }
        progress.add_embeddings_reused(entries.len() - pending.len());

        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch
                .iter()
                .map(|&i| CorpusEntry::embedding_text(&entries[i].title, &entries[i].abstract_text))
                .collect();
            progress.set_message(format!("Embedding {} papers", texts.len()));

            let vectors = with_deadline(
                "embedding corpus batch",
                self.timeout,
                self.embedder.embed_batch(&texts),
            )
            .await
            .inspect_err(|e| error!("Corpus embedding failed: {}", e))?;

            if vectors.len() != batch.len() {
                return Err(XplorerError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (&i, vector) in batch.iter().zip(vectors) {
                entries[i].embedding = vector;
                progress.inc_papers_indexed();
            }
            progress.add_embeddings_computed(batch.len());
        }

        let changed = changed_papers(previous, &entries);
        let snapshot = CorpusSnapshot::new(self.embedder.model_name(), entries);

        progress.finish();
        let stats = progress.get_stats();
        info!(
            "Ingested {} papers ({} failed) in {:.2}s",
            stats.papers_indexed, stats.papers_failed, stats.duration_secs
        );

        Ok(IngestOutcome {
            snapshot,
            stats,
            changed,
        })
    }

    async fn parse_all(&self, ids: Vec<PaperId>, progress: Arc<ProgressTracker>) -> Vec<ParsedPaper> {
        stream::iter(ids)
            .map(|id| {
                let progress = Arc::clone(&progress);
                async move {
                    match self.parse_one(&id).await {
                        Ok(paper) => {
                            progress.add_bytes_processed(paper.bytes);
                            Some(paper)
                        }
                        Err(e) => {
                            progress.inc_papers_failed();
                            warn!("Failed to ingest {}: {}", id, e);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .filter_map(|result| async move { result })
            .collect()
            .await
    }

    async fn parse_one(&self, id: &PaperId) -> Result<ParsedPaper> {
        let source = self.source.fetch(id).await?;
        let content_hash = source.content_hash.clone();
        let bytes = source.content.len() as u64;
        let parser = Arc::clone(&self.parser);

        let document = tokio::task::spawn_blocking(move || {
            parser.parse(&source.id, &source.content, source.kind)
        })
        .await
        .map_err(|e| XplorerError::Unavailable(format!("parse task for {} failed: {}", id, e)))?;

        Ok(ParsedPaper {
            document,
            content_hash,
            bytes,
        })
    }
}

fn changed_papers(previous: Option<&CorpusSnapshot>, entries: &[CorpusEntry]) -> Vec<PaperId> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let current: HashSet<&PaperId> = entries.iter().map(|e| &e.id).collect();
    let mut changed: Vec<PaperId> = entries
        .iter()
        .filter(|e| {
            previous
                .get(&e.id)
                .is_some_and(|old| old.content_hash != e.content_hash)
        })
        .map(|e| e.id.clone())
        .collect();

    changed.extend(
        previous
            .entries()
            .iter()
            .filter(|old| !current.contains(&old.id))
            .map(|old| old.id.clone()),
    );
    changed
}
