// file: src/parser/plaintext.rs
// description: text extracted from typeset papers, structured by numbered heading lines
// reference: https://docs.rs/regex

use super::ParsedBody;
use super::patterns::{PLAIN_CITATION, PLAIN_FIGURE, PLAIN_HEADING, citation_markers, figure_marker};
use super::tree::SectionTreeBuilder;
use std::collections::BTreeMap;

const MAX_HEADING_WORDS: usize = 10;

/// Extracted text has no parsed bibliography, so its bracketed citations
/// become markers that cannot be resolved.
pub struct PlainTextParser {
    title_known: bool,
}

impl PlainTextParser {
    pub fn new(title_known: bool) -> Self {
        Self { title_known }
    }

    pub fn parse(&self, content: &str) -> ParsedBody {
        let mut tree = SectionTreeBuilder::new("");
        let mut title = None;
        let mut abstract_parts = Vec::new();
        let mut in_abstract = false;
        let mut paragraph: Vec<String> = Vec::new();

        let mut flush = |paragraph: &mut Vec<String>,
                         tree: &mut SectionTreeBuilder,
                         in_abstract: bool| {
            if paragraph.is_empty() {
                return;
            }
            let joined = paragraph.join(" ");
            paragraph.clear();
            let text = PLAIN_CITATION
                .replace_all(&joined, |caps: &regex::Captures| citation_markers(&caps[1]))
                .to_string();
            if in_abstract {
                abstract_parts.push(text);
            } else {
                tree.push_paragraph(&text);
            }
        };

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() {
                flush(&mut paragraph, &mut tree, in_abstract);
                continue;
            }

            if !self.title_known && title.is_none() {
                title = Some(line.to_string());
                continue;
            }

            let lower = line.to_lowercase();
            if lower == "abstract" {
                flush(&mut paragraph, &mut tree, in_abstract);
                in_abstract = true;
                continue;
            }

            if lower == "references" || lower == "bibliography" {
                flush(&mut paragraph, &mut tree, in_abstract);
                in_abstract = false;
                tree.open(1, "References");
                continue;
            }

            if let Some(caps) = PLAIN_HEADING.captures(line)
                && caps[2].split_whitespace().count() <= MAX_HEADING_WORDS
            {
                flush(&mut paragraph, &mut tree, in_abstract);
                in_abstract = false;
                let level = caps[1].split('.').count().min(u8::MAX as usize) as u8;
                tree.open(level, caps[2].trim());
                continue;
            }

            if let Some(caps) = PLAIN_FIGURE.captures(line) {
                flush(&mut paragraph, &mut tree, in_abstract);
                let label = format!("figure{}", &caps[1]);
                let caption = caps[2].trim().to_string();
                tree.add_figure(&label, vec![caption.clone()], Vec::new());
                tree.push_paragraph(&figure_marker(&label, &caption));
                continue;
            }

            paragraph.push(line.to_string());
        }
        flush(&mut paragraph, &mut tree, in_abstract);

        let abstract_text = if abstract_parts.is_empty() {
            None
        } else {
            Some(abstract_parts.join("\n\n"))
        };

        ParsedBody {
            title,
            authors: Vec::new(),
            abstract_text,
            tree,
            citations: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROOT;

    const PAPER: &str = "Polynomial-Time Factoring on a Quantum Computer

Abstract
We show how to factor integers
in polynomial time [1].

1 Introduction
Classical factoring is believed hard [2, 3].

2 The Algorithm
Overview text.

2.1 Period Finding
The quantum Fourier transform finds the period.
Figure 1: Circuit for period finding.

References
[1] P. Shor. Algorithms for quantum computation.
";

    #[test]
    fn test_outline_from_numbered_lines() {
        let parsed = PlainTextParser::new(false).parse(PAPER);
        assert_eq!(
            parsed.title.as_deref(),
            Some("Polynomial-Time Factoring on a Quantum Computer")
        );
        assert_eq!(
            parsed.abstract_text.as_deref(),
            Some("We show how to factor integers in polynomial time <cit. 1>.")
        );
        assert!(parsed.citations.is_empty());

        let (nodes, figures) = parsed.tree.finish();
        let top: Vec<&str> = nodes[ROOT]
            .children
            .iter()
            .map(|&i| nodes[i].title.as_str())
            .collect();
        assert_eq!(top, vec!["Introduction", "The Algorithm", "References"]);

        let algorithm = &nodes[nodes[ROOT].children[1]];
        let period = &nodes[algorithm.children[0]];
        assert_eq!(period.title, "Period Finding");
        assert_eq!(period.figures, vec!["figure1"]);
        assert!(period.content.ends_with("<fig. figure1: Circuit for period finding.>"));
        assert_eq!(figures["figure1"].section_title.as_deref(), Some("Period Finding"));

        let intro = &nodes[nodes[ROOT].children[0]];
        assert_eq!(
            intro.content,
            "Classical factoring is believed hard <cit. 2> <cit. 3>."
        );
    }
}
