// file: src/parser/tree.rs
// description: incremental builder for the section arena, shared by every source format
// reference: internal data structures

use crate::models::{Figure, ROOT, SectionNode};
use crate::utils::text::word_count;
use std::collections::BTreeMap;

pub const FALLBACK_SECTION_TITLE: &str = "Full Text";

/// Builds the section arena from a flat stream of headings and paragraphs.
///
/// Headings carry an absolute level; a heading closes every open section at
/// the same or deeper level, so documents starting at `##` nest the same way
/// as documents starting at `#`.
pub struct SectionTreeBuilder {
    nodes: Vec<SectionNode>,
    levels: Vec<u8>,
    stack: Vec<usize>,
    figures: BTreeMap<String, Figure>,
}

impl SectionTreeBuilder {
    pub fn new(root_title: &str) -> Self {
        Self {
            nodes: vec![SectionNode {
                title: root_title.to_string(),
                ..Default::default()
            }],
            levels: vec![0],
            stack: vec![ROOT],
            figures: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> usize {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    pub fn has_sections(&self) -> bool {
        self.nodes.len() > 1
    }

    pub fn set_root_title(&mut self, title: &str) {
        self.nodes[ROOT].title = title.to_string();
    }

    pub fn open(&mut self, level: u8, title: &str) -> usize {
        let level = level.max(1);
        while let Some(&top) = self.stack.last() {
            if top != ROOT && self.levels[top] >= level {
                self.stack.pop();
            } else {
                break;
            }
        }

        let parent = self.current();
        let index = self.nodes.len();
        self.nodes.push(SectionNode {
            title: title.to_string(),
            ..Default::default()
        });
        self.levels.push(level);
        self.nodes[parent].children.push(index);
        self.stack.push(index);
        index
    }

    pub fn push_paragraph(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let current = self.current();
        let node = &mut self.nodes[current];
        if !node.content.is_empty() {
            node.content.push_str("\n\n");
        }
        node.content.push_str(text);
    }

    /// Section title a newly seen figure is attributed to; `None` at the root.
    pub fn current_section_title(&self) -> Option<String> {
        let current = self.current();
        (current != ROOT).then(|| self.nodes[current].title.clone())
    }

    /// Registers a figure panel; panels sharing a label merge into one figure.
    pub fn add_figure(&mut self, label: &str, captions: Vec<String>, image_urls: Vec<String>) {
        let section_title = self.current_section_title();
        let figure = self
            .figures
            .entry(label.to_string())
            .or_insert_with(|| Figure {
                label: label.to_string(),
                captions: Vec::new(),
                section_title,
                image_urls: Vec::new(),
            });

        for caption in captions {
            let caption = caption.trim();
            if !caption.is_empty() && !figure.captions.iter().any(|c| c == caption) {
                figure.captions.push(caption.to_string());
            }
        }
        for url in image_urls {
            if !figure.image_urls.contains(&url) {
                figure.image_urls.push(url);
            }
        }

        let current = self.current();
        let node = &mut self.nodes[current];
        if !node.figures.iter().any(|l| l == label) {
            node.figures.push(label.to_string());
        }
    }

    /// Finalizes word counts. Without any heading the whole text moves into a
    /// single top-level section so every document has an addressable section.
    pub fn finish(mut self) -> (Vec<SectionNode>, BTreeMap<String, Figure>) {
        if !self.has_sections() && !self.nodes[ROOT].content.trim().is_empty() {
            let content = std::mem::take(&mut self.nodes[ROOT].content);
            let figures = std::mem::take(&mut self.nodes[ROOT].figures);
            self.nodes.push(SectionNode {
                title: FALLBACK_SECTION_TITLE.to_string(),
                content,
                figures,
                ..Default::default()
            });
            self.nodes[ROOT].children.push(1);
        }

        for node in &mut self.nodes {
            node.word_count = word_count(&node.content);
        }

        (self.nodes, self.figures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_by_level() {
        let mut builder = SectionTreeBuilder::new("Paper");
        builder.push_paragraph("preamble");
        builder.open(2, "Intro");
        builder.push_paragraph("intro text");
        builder.open(2, "Model");
        builder.open(3, "Encoder");
        builder.push_paragraph("encoder text here");
        builder.open(3, "Decoder");
        builder.open(2, "Results");

        let (nodes, _) = builder.finish();
        assert_eq!(nodes[ROOT].children, vec![1, 2, 5]);
        assert_eq!(nodes[2].children, vec![3, 4]);
        assert_eq!(nodes[3].word_count, 3);
        assert_eq!(nodes[ROOT].content, "preamble");
    }

    #[test]
    fn test_fallback_single_section() {
        let mut builder = SectionTreeBuilder::new("Paper");
        builder.push_paragraph("just some text");
        builder.push_paragraph("and more");

        let (nodes, _) = builder.finish();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[ROOT].children, vec![1]);
        assert_eq!(nodes[1].title, FALLBACK_SECTION_TITLE);
        assert_eq!(nodes[1].content, "just some text\n\nand more");
        assert_eq!(nodes[1].word_count, 5);
        assert!(nodes[ROOT].content.is_empty());
    }

    #[test]
    fn test_figure_panels_merge() {
        let mut builder = SectionTreeBuilder::new("Paper");
        builder.add_figure("root-fig", vec!["at root".into()], vec![]);
        builder.open(1, "Method");
        builder.add_figure("panels", vec!["(a) left".into()], vec!["a.png".into()]);
        builder.add_figure("panels", vec!["(b) right".into()], vec!["b.png".into()]);

        let (nodes, figures) = builder.finish();
        let panels = &figures["panels"];
        assert_eq!(panels.caption(), "(a) left\n(b) right");
        assert_eq!(panels.image_urls, vec!["a.png", "b.png"]);
        assert_eq!(panels.section_title.as_deref(), Some("Method"));
        assert_eq!(figures["root-fig"].section_title, None);
        assert_eq!(nodes[1].figures, vec!["panels"]);
    }
}
