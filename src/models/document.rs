// file: src/models/document.rs
// description: parsed paper model backed by an arena of section nodes
// reference: internal data structures

use super::paper_id::PaperId;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Index of the synthetic root node in [`Document::sections`].
pub const ROOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markdown,
    Latex,
    PlainText,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Latex => "latex",
            Self::PlainText => "plaintext",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionNode {
    pub title: String,
    /// Words in `content` only, never in descendants.
    pub word_count: usize,
    pub children: Vec<usize>,
    pub content: String,
    /// Labels of figures referenced directly in this node.
    pub figures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub label: String,
    pub captions: Vec<String>,
    pub section_title: Option<String>,
    pub image_urls: Vec<String>,
}

impl Figure {
    pub fn caption(&self) -> String {
        self.captions.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: PaperId,
    pub title: String,
    pub authors: Vec<String>,
    pub date: Option<NaiveDate>,
    pub abstract_text: String,
    pub source_kind: SourceKind,
    pub sections: Vec<SectionNode>,
    pub citations: BTreeMap<String, String>,
    pub figures: BTreeMap<String, Figure>,
    pub can_read_citation: bool,
}

impl Document {
    pub fn root(&self) -> &SectionNode {
        &self.sections[ROOT]
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    pub fn num_figures(&self) -> usize {
        self.figures.len()
    }

    /// Descendants of `index` in document order, excluding `index` itself.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = match self.sections.get(index) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };

        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.sections[current].children.iter().rev().copied());
        }

        out
    }

    /// Every node in document order paired with its 1-indexed path; the root has an empty path.
    pub fn walk(&self) -> Vec<(usize, Vec<usize>)> {
        let mut out = vec![(ROOT, Vec::new())];
        let mut stack: Vec<(usize, Vec<usize>)> = self.root()
            .children
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &child)| (child, vec![i + 1]))
            .collect();

        while let Some((index, path)) = stack.pop() {
            for (i, &child) in self.sections[index].children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(i + 1);
                stack.push((child, child_path));
            }
            out.push((index, path));
        }

        out
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01-01", raw), "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(title: &str, children: Vec<usize>) -> SectionNode {
        SectionNode {
            title: title.to_string(),
            children,
            ..Default::default()
        }
    }

    fn sample() -> Document {
        Document {
            id: PaperId::parse("1706.03762").unwrap(),
            title: "Sample".to_string(),
            authors: vec!["Ada Lovelace".to_string()],
            date: parse_date("2017-06"),
            abstract_text: String::new(),
            source_kind: SourceKind::Markdown,
            sections: vec![
                node("Sample", vec![1, 3]),
                node("One", vec![2]),
                node("One.One", vec![]),
                node("Two", vec![]),
            ],
            citations: BTreeMap::new(),
            figures: BTreeMap::new(),
            can_read_citation: false,
        }
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = sample();
        assert_eq!(doc.descendants(ROOT), vec![1, 2, 3]);
        assert_eq!(doc.descendants(1), vec![2]);
        assert!(doc.descendants(3).is_empty());
    }

    #[test]
    fn test_walk_paths() {
        let doc = sample();
        assert_eq!(
            doc.walk(),
            vec![(0, vec![]), (1, vec![1]), (2, vec![1, 1]), (3, vec![2])]
        );
    }

    #[test]
    fn test_parse_date_precisions() {
        assert_eq!(parse_date("2017-06-12"), NaiveDate::from_ymd_opt(2017, 6, 12));
        assert_eq!(parse_date("2017-06"), NaiveDate::from_ymd_opt(2017, 6, 1));
        assert_eq!(parse_date("1998"), NaiveDate::from_ymd_opt(1998, 1, 1));
        assert_eq!(parse_date("June 2017"), None);
        assert_eq!(sample().year(), Some(2017));
    }
}
