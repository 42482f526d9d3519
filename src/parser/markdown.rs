// file: src/parser/markdown.rs
// description: markdown papers to a section tree with pulldown-cmark
// reference: https://docs.rs/pulldown-cmark

use super::ParsedBody;
use super::patterns::{BIB_ENTRY, MD_CITATION, citation_markers, clean_title, figure_marker};
use super::tree::SectionTreeBuilder;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Body,
    Abstract,
    Bibliography,
}

struct PendingImage {
    path: String,
    label: String,
    alt: String,
}

/// Headings become sections, `[@key]` becomes a citation marker and images
/// become figures. An image title of the form `fig:label` names the figure;
/// consecutive images sharing a label are panels of one figure.
pub struct MarkdownParser {
    title_known: bool,
    mode: Mode,
    title: Option<String>,
    tree: SectionTreeBuilder,
    citations: BTreeMap<String, String>,
    abstract_parts: Vec<String>,
    paragraph: String,
    heading: Option<(u8, String)>,
    image: Option<PendingImage>,
}

impl MarkdownParser {
    pub fn new(title_known: bool) -> Self {
        Self {
            title_known,
            mode: Mode::Body,
            title: None,
            tree: SectionTreeBuilder::new(""),
            citations: BTreeMap::new(),
            abstract_parts: Vec::new(),
            paragraph: String::new(),
            heading: None,
            image: None,
        }
    }

    pub fn parse(mut self, content: &str) -> ParsedBody {
        for event in Parser::new(content) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    self.flush();
                    self.heading = Some((level as u8, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = self.heading.take() {
                        self.heading_done(level, text.trim());
                    }
                }
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    self.image = Some(PendingImage {
                        path: dest_url.to_string(),
                        label: title.trim().trim_start_matches("fig:").to_string(),
                        alt: String::new(),
                    });
                }
                Event::End(TagEnd::Image) => {
                    if let Some(image) = self.image.take() {
                        self.image_done(image);
                    }
                }
                Event::Start(Tag::CodeBlock(_)) | Event::Start(Tag::Item) => self.flush(),
                Event::End(TagEnd::CodeBlock)
                | Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Item) => self.flush(),
                Event::Text(text) | Event::Code(text) => self.push_text(&text),
                Event::SoftBreak => self.push_text(" "),
                Event::HardBreak => self.push_text("\n"),
                _ => {}
            }
        }
        self.flush();

        let abstract_text = if self.abstract_parts.is_empty() {
            None
        } else {
            Some(self.abstract_parts.join("\n\n"))
        };

        ParsedBody {
            title: self.title,
            authors: Vec::new(),
            abstract_text,
            tree: self.tree,
            citations: self.citations,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, heading)) = self.heading.as_mut() {
            heading.push_str(text);
        } else if let Some(image) = self.image.as_mut() {
            image.alt.push_str(text);
        } else {
            self.paragraph.push_str(text);
        }
    }

    fn heading_done(&mut self, level: u8, text: &str) {
        if level == 1 && !self.title_known && self.title.is_none() && !self.tree.has_sections() {
            self.title = Some(text.to_string());
            return;
        }

        let title = clean_title(text);
        match title.to_lowercase().as_str() {
            "abstract" => self.mode = Mode::Abstract,
            "references" | "bibliography" => {
                self.mode = Mode::Bibliography;
                self.tree.open(level, &title);
            }
            _ => {
                self.mode = Mode::Body;
                self.tree.open(level, &title);
            }
        }
    }

    fn image_done(&mut self, image: PendingImage) {
        let label = if image.label.is_empty() {
            Path::new(&image.path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("figure")
                .to_string()
        } else {
            image.label
        };
        let caption = image.alt.trim().to_string();

        self.paragraph.push_str(&figure_marker(&label, &caption));
        self.tree.add_figure(&label, vec![caption], vec![image.path]);
    }

    fn flush(&mut self) {
        let raw = std::mem::take(&mut self.paragraph);
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }

        let text = MD_CITATION
            .replace_all(raw, |caps: &regex::Captures| citation_markers(&caps[1]))
            .to_string();

        match self.mode {
            Mode::Abstract => self.abstract_parts.push(text),
            Mode::Bibliography => {
                for line in text.lines() {
                    if let Some(caps) = BIB_ENTRY.captures(line) {
                        self.citations
                            .insert(caps[1].to_string(), caps[2].trim().to_string());
                    }
                }
                self.tree.push_paragraph(&text);
            }
            Mode::Body => self.tree.push_paragraph(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROOT;
    use pretty_assertions::assert_eq;

    const PAPER: &str = r#"# A Tiny Paper

## Abstract

We study tiny things.

## 1 Introduction

Prior work [@smith2020; @doe2019] looked at big things.

## 2 Method

Overview of the method.

![Encoder view](figs/enc.png "fig:pipeline")
![Decoder view](figs/dec.png "fig:pipeline")

### 2.1 Encoder

The encoder reads tokens `x`.

## References

- [smith2020] J. Smith. Big Things. 2020.
- [doe2019] J. Doe. Bigger Things. 2019.
"#;

    #[test]
    fn test_structure_and_metadata() {
        let parsed = MarkdownParser::new(false).parse(PAPER);
        assert_eq!(parsed.title.as_deref(), Some("A Tiny Paper"));
        assert_eq!(parsed.abstract_text.as_deref(), Some("We study tiny things."));

        let (nodes, figures) = parsed.tree.finish();
        let titles: Vec<&str> = nodes[ROOT]
            .children
            .iter()
            .map(|&i| nodes[i].title.as_str())
            .collect();
        assert_eq!(titles, vec!["Introduction", "Method", "References"]);

        let method = &nodes[nodes[ROOT].children[1]];
        assert_eq!(nodes[method.children[0]].title, "Encoder");
        assert_eq!(method.figures, vec!["pipeline"]);
        assert_eq!(figures["pipeline"].captions, vec!["Encoder view", "Decoder view"]);
        assert_eq!(figures["pipeline"].section_title.as_deref(), Some("Method"));
        assert!(method.content.contains("<fig. pipeline: Encoder view>"));
    }

    #[test]
    fn test_citation_markers_and_bibliography() {
        let parsed = MarkdownParser::new(false).parse(PAPER);
        assert_eq!(parsed.citations.len(), 2);
        assert_eq!(parsed.citations["doe2019"], "J. Doe. Bigger Things. 2019.");

        let (nodes, _) = parsed.tree.finish();
        let intro = &nodes[nodes[ROOT].children[0]];
        assert_eq!(
            intro.content,
            "Prior work <cit. smith2020> <cit. doe2019> looked at big things."
        );
    }

    #[test]
    fn test_known_title_keeps_first_heading_as_section() {
        let parsed = MarkdownParser::new(true).parse("# Introduction\n\nHello there.");
        assert!(parsed.title.is_none());
        let (nodes, _) = parsed.tree.finish();
        assert_eq!(nodes[1].title, "Introduction");
        assert_eq!(nodes[1].word_count, 2);
    }
}
