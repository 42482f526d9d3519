// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod mcp;
pub mod models;
pub mod navigator;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod service;
pub mod store;
pub mod utils;

pub use chunker::{ChunkIndex, Chunker};
pub use config::{Config, CorpusConfig, EmbeddingConfig, PipelineConfig, SearchConfig};
pub use embedding::{Embedder, HashedEmbedder, HttpEmbedder};
pub use error::{Result, XplorerError};
pub use index::{CorpusIndex, CorpusSnapshot, SnapshotStore};
pub use mcp::XplorerMcp;
pub use models::{
    Document, FigureView, PaperId, PaperMetadata, PaperSummary, SearchMethod, SectionAddress,
    SectionView,
};
pub use navigator::SectionNavigator;
pub use parser::DocumentParser;
pub use pipeline::{PipelineStats, ProgressTracker};
pub use service::{ServiceStats, XplorerService};
pub use store::{DirectorySource, DocumentStore, SourceProvider};
