// file: src/embedding/http.rs
// description: client for OpenAI-compatible embedding endpoints
// reference: https://platform.openai.com/docs/api-reference/embeddings

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{Result, XplorerError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            XplorerError::Config("embedding.endpoint is required for the http provider".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| XplorerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

/// 429 is rate limiting and 5xx is a struggling backend, both retriable;
/// any other failure status is a request the backend will keep rejecting.
fn status_error(status: StatusCode, body: &str) -> XplorerError {
    let message = format!("embedding request failed with status {}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        XplorerError::RateLimited(message)
    } else if status.is_server_error() {
        XplorerError::Unavailable(message)
    } else {
        XplorerError::Embedding(message)
    }
}

fn transport_error(err: reqwest::Error) -> XplorerError {
    if err.is_timeout() || err.is_connect() {
        XplorerError::Unavailable(format!("embedding backend unreachable: {}", err))
    } else {
        XplorerError::Embedding(format!("Failed to send embedding request: {}", err))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Requesting {} embeddings from {}", texts.len(), self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&EmbeddingRequest {
                input: texts,
                model: &self.model,
            });
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Embedding backend returned {}", status);
            return Err(status_error(status, &error_text));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            XplorerError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(XplorerError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(XplorerError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                bad.len()
            )));
        }

        Ok(vectors)
    }
}
