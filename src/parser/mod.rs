// file: src/parser/mod.rs
// description: source classification and dispatch from raw paper text to a Document
// reference: internal module structure

pub mod frontmatter;
pub mod latex;
pub mod markdown;
pub mod patterns;
pub mod plaintext;
pub mod tree;

pub use frontmatter::{Frontmatter, FrontmatterParser};
pub use latex::LatexParser;
pub use markdown::MarkdownParser;
pub use plaintext::PlainTextParser;
pub use tree::SectionTreeBuilder;

use crate::models::{Document, PaperId, SourceKind, parse_date};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Format-specific output before metadata is merged with frontmatter.
pub struct ParsedBody {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub abstract_text: Option<String>,
    pub tree: SectionTreeBuilder,
    pub citations: BTreeMap<String, String>,
}

/// Extension first, then content sniffing.
pub fn detect_kind(path: Option<&Path>, content: &str) -> SourceKind {
    let extension = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("md") | Some("markdown") => return SourceKind::Markdown,
        Some("tex") | Some("latex") => return SourceKind::Latex,
        Some("txt") => return SourceKind::PlainText,
        _ => {}
    }

    if content.contains("\\documentclass")
        || content.contains("\\begin{document}")
        || content.contains("\\section{")
    {
        SourceKind::Latex
    } else if content.lines().any(|l| l.starts_with("# ") || l.starts_with("## ")) {
        SourceKind::Markdown
    } else {
        SourceKind::PlainText
    }
}

pub struct DocumentParser {
    asset_base_url: String,
    frontmatter: FrontmatterParser,
}

impl DocumentParser {
    pub fn new(asset_base_url: &str) -> Self {
        Self {
            asset_base_url: asset_base_url.trim_end_matches('/').to_string(),
            frontmatter: FrontmatterParser::new(),
        }
    }

    /// Never fails: malformed frontmatter is ignored and structureless text
    /// becomes a single section.
    pub fn parse(&self, id: &PaperId, content: &str, kind: SourceKind) -> Document {
        let (frontmatter, body) = match self.frontmatter.extract(content) {
            Ok(Some((frontmatter, body))) => (frontmatter, body),
            Ok(None) => (Frontmatter::default(), content.to_string()),
            Err(e) => {
                warn!("Ignoring frontmatter of {}: {}", id, e);
                (Frontmatter::default(), content.to_string())
            }
        };

        let title_known = frontmatter.get("title").is_some();
        let parsed = match kind {
            SourceKind::Markdown => MarkdownParser::new(title_known).parse(&body),
            SourceKind::Latex => LatexParser::new().parse(&body),
            SourceKind::PlainText => PlainTextParser::new(title_known).parse(&body),
        };

        let title = frontmatter
            .get("title")
            .map(str::to_string)
            .or(parsed.title)
            .unwrap_or_else(|| id.to_string());

        let authors = match frontmatter.list("authors") {
            list if !list.is_empty() => list,
            _ => parsed.authors,
        };

        let date = frontmatter
            .get("date")
            .or_else(|| frontmatter.get("year"))
            .and_then(parse_date);

        let abstract_text = frontmatter
            .get("abstract")
            .map(str::to_string)
            .or(parsed.abstract_text)
            .map(|a| a.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let mut tree = parsed.tree;
        tree.set_root_title(&title);
        let (sections, mut figures) = tree.finish();

        for figure in figures.values_mut() {
            figure.image_urls = figure
                .image_urls
                .iter()
                .map(|path| self.asset_url(id, path))
                .collect();
        }

        let can_read_citation = !parsed.citations.is_empty();
        debug!(
            "Parsed {} as {}: {} sections, {} figures, {} citations",
            id,
            kind.as_str(),
            sections.len() - 1,
            figures.len(),
            parsed.citations.len()
        );

        Document {
            id: id.clone(),
            title,
            authors,
            date,
            abstract_text,
            source_kind: kind,
            sections,
            citations: parsed.citations,
            figures,
            can_read_citation,
        }
    }

    fn asset_url(&self, id: &PaperId, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        format!(
            "{}/{}/{}",
            self.asset_base_url,
            id.sanitized(),
            path.trim_start_matches("./").trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROOT;
    use crate::parser::tree::FALLBACK_SECTION_TITLE;

    fn id() -> PaperId {
        PaperId::parse("2101.00001").unwrap()
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(Some(Path::new("a.md")), ""), SourceKind::Markdown);
        assert_eq!(detect_kind(Some(Path::new("a.TEX")), ""), SourceKind::Latex);
        assert_eq!(detect_kind(None, "\\section{Intro}"), SourceKind::Latex);
        assert_eq!(detect_kind(None, "# Intro\ntext"), SourceKind::Markdown);
        assert_eq!(detect_kind(None, "1 Intro\ntext"), SourceKind::PlainText);
    }

    #[test]
    fn test_frontmatter_overrides_body_metadata() {
        let parser = DocumentParser::new("https://assets.example.org/");
        let content = "---\ntitle: From Frontmatter\nauthors: [Ada Lovelace, Grace Hopper]\ndate: 2021-01-04\n---\n# Body Title\n\n## Intro\n\n![Overview](img/overview.png \"fig:overview\")\n";
        let doc = parser.parse(&id(), content, SourceKind::Markdown);

        assert_eq!(doc.title, "From Frontmatter");
        assert_eq!(doc.first_author(), Some("Ada Lovelace"));
        assert_eq!(doc.year(), Some(2021));
        assert_eq!(
            doc.figures["overview"].image_urls,
            vec!["https://assets.example.org/2101_00001/img/overview.png"]
        );
    }

    #[test]
    fn test_structureless_text_falls_back_to_one_section() {
        let parser = DocumentParser::new("https://assets.example.org");
        let doc = parser.parse(
            &id(),
            "no headings anywhere\n\njust two paragraphs of text",
            SourceKind::PlainText,
        );

        assert_eq!(doc.root().children.len(), 1);
        let only = &doc.sections[doc.root().children[0]];
        assert_eq!(only.title, FALLBACK_SECTION_TITLE);
        assert!(only.content.contains("just two paragraphs"));
        assert!(doc.sections[ROOT].content.is_empty());
        assert!(!doc.can_read_citation);
    }

    #[test]
    fn test_malformed_frontmatter_is_ignored() {
        let parser = DocumentParser::new("https://assets.example.org");
        let doc = parser.parse(&id(), "---\ntitle: [oops\n---\n# Intro\n\ntext", SourceKind::Markdown);
        assert_eq!(doc.title, id().to_string());
        assert!(!doc.sections.is_empty());
    }
}
