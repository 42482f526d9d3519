// file: src/embedding/mod.rs
// description: embedding backends behind one trait plus vector similarity
// reference: https://docs.rs/async-trait

pub mod hashed;
pub mod http;

pub use hashed::HashedEmbedder;
pub use http::HttpEmbedder;

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::error::{Result, XplorerError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Recorded in corpus snapshots; vectors from different models never mix.
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| XplorerError::Embedding("backend returned no vector".to_string()))
    }
}

pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::Hashed => Arc::new(HashedEmbedder::new(&config.model, config.dimension)),
        EmbeddingProvider::Http => Arc::new(HttpEmbedder::new(config)?),
    };

    info!(
        "Using {} embeddings ({} dims)",
        embedder.model_name(),
        embedder.dimension()
    );
    Ok(embedder)
}

/// Cosine similarity; zero when either vector is empty, all zeros or the
/// dimensions differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_default_embedder() {
        let config = Config::default_config();
        let embedder = build_embedder(&config.embedding).unwrap();
        assert_eq!(embedder.model_name(), "hashed-bow-v1");
        assert_eq!(embedder.embed("quantum factoring").await.unwrap().len(), 512);
    }
}
