// file: src/navigator/mod.rs
// description: section address resolution, subtree reading and outline rendering
// reference: internal module structure

use crate::error::{Result, XplorerError};
use crate::models::{Document, FigureView, ROOT, SectionAddress, SectionView};
use std::collections::HashSet;

/// Read-only view over one document's section arena.
pub struct SectionNavigator<'a> {
    document: &'a Document,
}

impl<'a> SectionNavigator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Walks the 1-indexed path from the root and returns the arena index.
    pub fn resolve(&self, address: &SectionAddress) -> Result<usize> {
        let segments = address.segments()?;
        let mut current = ROOT;

        for segment in segments {
            current = *self.document.sections[current]
                .children
                .get(segment - 1)
                .ok_or_else(|| XplorerError::SectionNotFound {
                    paper_id: self.document.id.to_string(),
                    address: address.to_string(),
                })?;
        }

        Ok(current)
    }

    /// The node's own text followed by every descendant section, each headed
    /// by its title, with figures collected from the whole subtree.
    pub fn read(&self, address: &SectionAddress) -> Result<SectionView> {
        let index = self.resolve(address)?;
        let node = &self.document.sections[index];

        let mut parts: Vec<String> = Vec::new();
        if !node.content.is_empty() {
            parts.push(node.content.clone());
        }
        let mut labels: Vec<&str> = node.figures.iter().map(String::as_str).collect();

        for descendant in self.document.descendants(index) {
            let child = &self.document.sections[descendant];
            if child.content.is_empty() {
                parts.push(child.title.clone());
            } else {
                parts.push(format!("{}\n{}", child.title, child.content));
            }
            labels.extend(child.figures.iter().map(String::as_str));
        }

        let mut seen = HashSet::new();
        let figures = labels
            .into_iter()
            .filter(|label| seen.insert(*label))
            .filter_map(|label| self.document.figures.get(label))
            .map(FigureView::from)
            .collect();

        Ok(SectionView {
            title: node.title.clone(),
            text: parts.join("\n\n"),
            figures,
        })
    }

    /// One line per section, indented two spaces per level:
    /// `3.1. Encoder (120 words, 1 figure)`.
    pub fn table_of_contents(&self) -> String {
        self.document
            .walk()
            .into_iter()
            .filter(|(_, path)| !path.is_empty())
            .map(|(index, path)| {
                let node = &self.document.sections[index];
                let number = path
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(".");
                format!(
                    "{}{}. {} ({} words, {})",
                    "  ".repeat(path.len() - 1),
                    number,
                    node.title,
                    node.word_count,
                    figure_count(node.figures.len())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn figure_count(count: usize) -> String {
    match count {
        1 => "1 figure".to_string(),
        n => format!("{} figures", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperId, SourceKind};
    use crate::parser::DocumentParser;
    use pretty_assertions::assert_eq;

    const PAPER: &str = r#"---
title: Nested Things
---
## Introduction

Intro words here.

## Model

Model overview.

![Overall layout](img/layout.png "fig:layout")

### Encoder

Encoder text [@vaswani].

![Encoder detail](img/enc.png "fig:encoder")

### Decoder

Decoder text, see the layout again.

![Overall layout](img/layout.png "fig:layout")

## References

- [vaswani] A. Vaswani et al. Attention Is All You Need. NeurIPS 2017.
"#;

    fn document() -> Document {
        DocumentParser::new("https://assets.example.org").parse(
            &PaperId::parse("1706.03762").unwrap(),
            PAPER,
            SourceKind::Markdown,
        )
    }

    #[test]
    fn test_resolve_paths() {
        let doc = document();
        let nav = SectionNavigator::new(&doc);

        let model = nav.resolve(&SectionAddress::TopLevel(2)).unwrap();
        assert_eq!(doc.sections[model].title, "Model");

        let decoder = nav.resolve(&SectionAddress::Path(vec![2, 2])).unwrap();
        assert_eq!(doc.sections[decoder].title, "Decoder");

        assert!(matches!(
            nav.resolve(&SectionAddress::Path(vec![2, 3])),
            Err(XplorerError::SectionNotFound { .. })
        ));
        assert!(matches!(
            nav.resolve(&SectionAddress::Path(vec![1, 1])),
            Err(XplorerError::SectionNotFound { .. })
        ));
        assert!(matches!(
            nav.resolve(&SectionAddress::TopLevel(0)),
            Err(XplorerError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_read_includes_descendants_in_order() {
        let doc = document();
        let nav = SectionNavigator::new(&doc);

        let parent = nav.read(&SectionAddress::TopLevel(2)).unwrap();
        let encoder = nav.read(&SectionAddress::Path(vec![2, 1])).unwrap();
        let decoder = nav.read(&SectionAddress::Path(vec![2, 2])).unwrap();

        let encoder_at = parent.text.find(&encoder.text).unwrap();
        let decoder_at = parent.text.find(&decoder.text).unwrap();
        assert!(encoder_at < decoder_at);
        assert!(parent.text.starts_with("Model overview."));
        assert!(encoder.text.contains("<cit. vaswani>"));

        let labels: Vec<&str> = parent.figures.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["layout", "encoder"]);
        assert_eq!(parent.figures[0].section.as_deref(), Some("Model"));
    }

    #[test]
    fn test_read_is_idempotent() {
        let doc = document();
        let nav = SectionNavigator::new(&doc);
        let address = SectionAddress::Path(vec![2, 1]);
        assert_eq!(nav.read(&address).unwrap(), nav.read(&address).unwrap());
    }

    #[test]
    fn test_table_of_contents() {
        let doc = document();
        let toc = SectionNavigator::new(&doc).table_of_contents();
        let lines: Vec<&str> = toc.lines().collect();

        assert_eq!(lines[0], "1. Introduction (3 words, 0 figures)");
        assert!(lines[1].starts_with("2. Model ("));
        assert!(lines[1].ends_with(", 1 figure)"));
        assert!(lines[2].starts_with("  2.1. Encoder ("));
        assert!(lines[3].starts_with("  2.2. Decoder ("));
        assert!(lines[4].starts_with("3. References ("));
    }
}
