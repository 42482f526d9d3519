// file: src/models/chunk.rs
// description: bounded slices of one section's text used by in-paper search
// reference: internal data structures

use super::paper_id::PaperId;

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub paper_id: PaperId,
    /// Arena index of the owning section.
    pub section_index: usize,
    /// 1-indexed path of the owning section; empty for text before the first heading.
    pub section_path: Vec<usize>,
    pub section_title: String,
    /// 0-indexed position within the owning section.
    pub ordinal: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Standalone rendering: the section title on its own line, then the text.
    pub fn render(&self) -> String {
        format!("{}\n{}", self.section_title, self.text.trim())
    }
}
