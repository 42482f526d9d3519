// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod ingest;
mod progress;

pub use ingest::{IngestOutcome, Ingestor};
pub use progress::{PipelineStats, ProgressTracker};
