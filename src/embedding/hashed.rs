// file: src/embedding/hashed.rs
// description: deterministic local embeddings from hashed unigrams and bigrams
// reference: https://en.wikipedia.org/wiki/Feature_hashing

use super::Embedder;
use crate::error::Result;
use crate::utils::text::tokenize;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

const BIGRAM_WEIGHT: f32 = 0.5;

/// Signed feature hashing into a fixed number of buckets, L2 normalized.
/// Needs no network and gives the same vector for the same text on every run.
pub struct HashedEmbedder {
    model: String,
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(model: &str, dimension: usize) -> Self {
        Self {
            model: model.to_string(),
            dimension: dimension.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine;

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashedEmbedder::new("hashed-bow-v1", 256);
        let a = embedder.embed_text("Quantum algorithms for integer factoring");
        let b = embedder.embed_text("Quantum algorithms for integer factoring");
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_related_text_scores_higher() {
        let embedder = HashedEmbedder::new("hashed-bow-v1", 512);
        let query = embedder.embed_text("period finding quantum fourier transform");
        let related = embedder.embed_text("The quantum Fourier transform reveals the period.");
        let unrelated = embedder.embed_text("Residual connections ease optimization of deep networks.");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashedEmbedder::new("hashed-bow-v1", 16);
        assert!(embedder.embed_text("the of a").iter().all(|v| *v == 0.0));
    }
}
