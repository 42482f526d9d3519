// file: src/resolver/mod.rs
// description: inline marker lookups against a document's citation and figure maps
// reference: internal module structure

pub mod citation;
pub mod figure;

pub use citation::CitationResolver;
pub use figure::FigureResolver;
