// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, XplorerError};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    pub source_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub asset_base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Hashed,
    Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
    pub timeout_ms: u64,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub default_count: usize,
    pub chunk_count: usize,
    pub max_count: usize,
    pub snippet_words: usize,
    pub lookup_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PAPER_XPLORER")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| XplorerError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| XplorerError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            corpus: CorpusConfig {
                source_dir: PathBuf::from("./fixtures/papers"),
                snapshot_path: PathBuf::from("data/corpus_snapshot.json"),
                asset_base_url: "https://assets.paper-xplorer.local".to_string(),
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProvider::Hashed,
                endpoint: None,
                api_key: None,
                model: "hashed-bow-v1".to_string(),
                dimension: 512,
                timeout_ms: 5_000,
                batch_size: 32,
            },
            search: SearchConfig {
                default_count: 8,
                chunk_count: 4,
                max_count: 50,
                snippet_words: 60,
                lookup_timeout_ms: 2_000,
            },
            store: StoreConfig { cache_capacity: 15 },
            pipeline: PipelineConfig {
                parallel_workers: 4,
                skip_patterns: vec![".git/".to_string(), "*.png".to_string()],
                max_file_size_mb: 20,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(XplorerError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.embedding.dimension == 0 || self.embedding.batch_size == 0 {
            return Err(XplorerError::Config(
                "embedding dimension and batch_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProvider::Http && self.embedding.endpoint.is_none()
        {
            return Err(XplorerError::Config(
                "embedding.endpoint is required for the http provider".to_string(),
            ));
        }

        if self.search.default_count == 0
            || self.search.chunk_count == 0
            || self.search.max_count < self.search.default_count
        {
            return Err(XplorerError::Config(
                "search counts must be positive and max_count >= default_count".to_string(),
            ));
        }

        if self.embedding.timeout_ms == 0 || self.search.lookup_timeout_ms == 0 {
            return Err(XplorerError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if self.store.cache_capacity == 0 {
            return Err(XplorerError::Config(
                "cache_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
