// file: src/chunker/mod.rs
// description: per-section 250 word chunking and in-paper semantic chunk search
// reference: internal module structure

use crate::embedding::{Embedder, cosine};
use crate::error::{Result, XplorerError};
use crate::models::{Chunk, Document, PaperId};
use crate::utils::text::word_starts;
use crate::utils::{OperationTimer, paginate, with_deadline};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const MAX_CHUNK_WORDS: usize = 250;

/// Consecutive windows of at most [`MAX_CHUNK_WORDS`] words. Each window
/// ends where the next begins, so the windows concatenate back to `content`.
pub fn split_section(content: &str) -> Vec<String> {
    let starts = word_starts(content);
    if starts.is_empty() {
        return Vec::new();
    }

    let mut boundaries: Vec<usize> = starts
        .iter()
        .step_by(MAX_CHUNK_WORDS)
        .skip(1)
        .copied()
        .collect();
    boundaries.insert(0, 0);
    boundaries.push(content.len());

    boundaries
        .windows(2)
        .map(|w| content[w[0]..w[1]].to_string())
        .collect()
}

/// Chunks of one paper with their embeddings, in document order.
#[derive(Debug)]
pub struct ChunkIndex {
    pub paper_id: PaperId,
    pub chunks: Vec<Chunk>,
}

impl ChunkIndex {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks by descending similarity; equal scores keep document order.
    pub fn rank(&self, query: &[f32]) -> Vec<(&Chunk, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine(query, &chunk.embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .map(|(i, score)| (&self.chunks[i], score))
            .collect()
    }
}

pub struct Chunker {
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
    batch_size: usize,
}

impl Chunker {
    pub fn new(embedder: Arc<dyn Embedder>, timeout: Duration, batch_size: usize) -> Self {
        Self {
            embedder,
            timeout,
            batch_size: batch_size.max(1),
        }
    }

    /// Sections in pre-order, root first; sections without words yield nothing.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (index, path) in document.walk() {
            let node = &document.sections[index];
            for (ordinal, text) in split_section(&node.content).into_iter().enumerate() {
                chunks.push(Chunk {
                    paper_id: document.id.clone(),
                    section_index: index,
                    section_path: path.clone(),
                    section_title: node.title.clone(),
                    ordinal,
                    text,
                    embedding: Vec::new(),
                });
            }
        }

        chunks
    }

    pub async fn build(&self, document: &Document) -> Result<ChunkIndex> {
        let timer = OperationTimer::new(&format!("chunk {}", document.id));
        let mut chunks = self.chunk(document);
        let inputs: Vec<String> = chunks.iter().map(Chunk::render).collect();

        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            let embedded = with_deadline(
                "embedding chunks",
                self.timeout,
                self.embedder.embed_batch(batch),
            )
            .await?;
            vectors.extend(embedded);
        }

        if vectors.len() != chunks.len() {
            return Err(XplorerError::Embedding(format!(
                "expected {} chunk embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        for (chunk, vector) in chunks.iter_mut().zip(vectors) {
            chunk.embedding = vector;
        }

        debug!("Built {} chunks for {}", chunks.len(), document.id);
        timer.finish_with_count(chunks.len());

        Ok(ChunkIndex {
            paper_id: document.id.clone(),
            chunks,
        })
    }

    /// Page `page` of chunk texts, each prefixed by its section title. Pages
    /// past the end are empty.
    pub async fn search(
        &self,
        index: &ChunkIndex,
        query: &str,
        count: usize,
        page: usize,
    ) -> Result<Vec<String>> {
        let query_vector =
            with_deadline("embedding query", self.timeout, self.embedder.embed(query)).await?;

        let ranked: Vec<String> = index
            .rank(&query_vector)
            .into_iter()
            .map(|(chunk, _)| chunk.render())
            .collect();

        Ok(paginate(ranked, count, page))
    }
}
