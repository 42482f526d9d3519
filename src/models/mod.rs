// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod address;
pub mod chunk;
pub mod corpus;
pub mod document;
pub mod paper_id;

pub use address::SectionAddress;
pub use chunk::Chunk;
pub use corpus::{FigureView, PaperMetadata, PaperSummary, SearchMethod, SectionView};
pub use document::{Document, Figure, ROOT, SectionNode, SourceKind, parse_date};
pub use paper_id::PaperId;
