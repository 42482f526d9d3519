// file: src/parser/latex.rs
// description: LaTeX sources to a section tree, citations and figures
// reference: https://docs.rs/regex

use super::ParsedBody;
use super::patterns::{
    BLANK_LINES, LATEX_ABSTRACT, LATEX_BARE_CMD, LATEX_BIBITEM, LATEX_BIBLIOGRAPHY, LATEX_CITE,
    LATEX_COMMENT, LATEX_ENV, LATEX_FIGURE_ENV, LATEX_FORMAT_CMD, LATEX_GRAPHICS, LATEX_HEADING,
    LATEX_LABEL, LATEX_REF, citation_markers, clean_title, figure_marker,
};
use super::tree::SectionTreeBuilder;
use std::collections::BTreeMap;
use std::path::Path;

const REFERENCES_TITLE: &str = "References";

pub struct LatexParser;

impl LatexParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, source: &str) -> ParsedBody {
        let source = LATEX_COMMENT.replace_all(source, "$1").to_string();

        let title = command_arguments(&source, "title")
            .first()
            .map(|t| clean_inline(t))
            .filter(|t| !t.is_empty());
        let authors = command_arguments(&source, "author")
            .first()
            .map(|a| split_authors(a))
            .unwrap_or_default();

        let body = document_body(&source);
        let abstract_text = LATEX_ABSTRACT
            .captures(body)
            .map(|caps| clean_inline(&caps[1]))
            .filter(|a| !a.is_empty());
        let body = LATEX_ABSTRACT.replace(body, "").to_string();

        let citations = LATEX_BIBLIOGRAPHY
            .captures(&body)
            .map(|caps| parse_bibitems(&caps[1]))
            .unwrap_or_default();
        let body = LATEX_BIBLIOGRAPHY.replace(&body, "").to_string();

        let mut tree = SectionTreeBuilder::new("");
        let mut cursor = 0;
        let mut heading: Option<(u8, String)> = None;

        while let Some(caps) = LATEX_HEADING.captures_at(&body, cursor) {
            let Some(whole) = caps.get(0) else { break };
            let level = match &caps[1] {
                "section" => 1,
                "subsection" => 2,
                _ => 3,
            };
            let Some((raw_title, end)) = balanced_group(&body, whole.end() - 1) else {
                break;
            };

            self.emit(&mut tree, heading.take(), &body[cursor..whole.start()]);
            heading = Some((level, clean_title(&clean_inline(&raw_title))));
            cursor = end;
        }
        self.emit(&mut tree, heading, &body[cursor..]);

        if !citations.is_empty() {
            tree.open(1, REFERENCES_TITLE);
            for (key, text) in &citations {
                tree.push_paragraph(&format!("[{}] {}", key, text));
            }
        }

        ParsedBody {
            title,
            authors,
            abstract_text,
            tree,
            citations,
        }
    }

    fn emit(&self, tree: &mut SectionTreeBuilder, heading: Option<(u8, String)>, text: &str) {
        if let Some((level, title)) = heading {
            tree.open(level, &title);
        }

        let mut expanded = String::with_capacity(text.len());
        let mut last = 0;
        for caps in LATEX_FIGURE_ENV.captures_iter(text) {
            let Some(env) = caps.get(0) else { continue };
            expanded.push_str(&text[last..env.start()]);
            expanded.push_str("\n\n");
            expanded.push_str(&self.figure(tree, &caps[1]));
            expanded.push_str("\n\n");
            last = env.end();
        }
        expanded.push_str(&text[last..]);

        for paragraph in BLANK_LINES.split(&expanded) {
            tree.push_paragraph(&clean_inline(paragraph));
        }
    }

    /// Registers the figure in the current section and returns its inline marker.
    fn figure(&self, tree: &mut SectionTreeBuilder, env: &str) -> String {
        let captions: Vec<String> = command_arguments(env, "caption")
            .iter()
            .map(|c| clean_inline(c))
            .filter(|c| !c.is_empty())
            .collect();
        let images: Vec<String> = LATEX_GRAPHICS
            .captures_iter(env)
            .map(|caps| caps[1].trim().to_string())
            .collect();

        let label = LATEX_LABEL
            .captures(env)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_else(|| {
                let stems: Vec<&str> = images
                    .iter()
                    .filter_map(|p| Path::new(p).file_stem().and_then(|s| s.to_str()))
                    .collect();
                if stems.is_empty() {
                    "figure".to_string()
                } else {
                    stems.join("_")
                }
            });

        let marker = figure_marker(&label, &captions.join(" "));
        tree.add_figure(&label, captions, images);
        marker
    }
}

impl Default for LatexParser {
    fn default() -> Self {
        Self::new()
    }
}

fn document_body(source: &str) -> &str {
    let start = source
        .find("\\begin{document}")
        .map(|i| i + "\\begin{document}".len())
        .unwrap_or(0);
    let end = source[start..]
        .find("\\end{document}")
        .map(|i| start + i)
        .unwrap_or(source.len());
    &source[start..end]
}

fn parse_bibitems(block: &str) -> BTreeMap<String, String> {
    let items: Vec<(String, usize, usize)> = LATEX_BIBITEM
        .captures_iter(block)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps[1].trim().to_string(), whole.start(), whole.end()))
        })
        .collect();

    let mut citations = BTreeMap::new();
    for (i, (key, _, text_start)) in items.iter().enumerate() {
        let text_end = items.get(i + 1).map(|next| next.1).unwrap_or(block.len());
        let text = clean_inline(&block[*text_start..text_end]);
        if !text.is_empty() {
            citations.insert(key.clone(), text);
        }
    }
    citations
}

fn split_authors(raw: &str) -> Vec<String> {
    raw.split("\\and")
        .filter_map(|author| author.split("\\\\").next())
        .map(|name| {
            let without_notes = command_arguments(name, "thanks")
                .iter()
                .fold(name.to_string(), |acc, note| {
                    acc.replace(&format!("\\thanks{{{}}}", note), "")
                });
            clean_inline(&without_notes)
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Markers for citations and references, then strips remaining markup.
fn clean_inline(text: &str) -> String {
    let mut out = LATEX_CITE
        .replace_all(text, |caps: &regex::Captures| citation_markers(&caps[1]))
        .to_string();
    out = LATEX_REF.replace_all(&out, "<ref. $1>").to_string();
    out = LATEX_LABEL.replace_all(&out, "").to_string();
    out = LATEX_ENV.replace_all(&out, " ").to_string();

    for _ in 0..4 {
        let next = LATEX_FORMAT_CMD.replace_all(&out, "$1").to_string();
        if next == out {
            break;
        }
        out = next;
    }

    out = out
        .replace("\\\\", " ")
        .replace("\\%", "%")
        .replace("\\&", "&")
        .replace("\\_", "_")
        .replace('~', " ");
    out = LATEX_BARE_CMD.replace_all(&out, "").to_string();
    out = out.replace(['{', '}'], "");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of the brace group opening at `open`, and the offset just past it.
fn balanced_group(text: &str, open: usize) -> Option<(String, usize)> {
    if !text[open..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    for (offset, ch) in text[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = open + offset;
                    return Some((text[open + 1..end].to_string(), end + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Arguments of every `\name[...]{...}` occurrence, brace-balanced.
fn command_arguments(text: &str, name: &str) -> Vec<String> {
    let needle = format!("\\{}", name);
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(pos) = text[from..].find(&needle) {
        let mut idx = from + pos + needle.len();
        from = idx;

        if text[idx..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            continue;
        }

        idx += text[idx..].len() - text[idx..].trim_start().len();
        if text[idx..].starts_with('[') {
            match text[idx..].find(']') {
                Some(close) => idx += close + 1,
                None => break,
            }
            idx += text[idx..].len() - text[idx..].trim_start().len();
        }

        if let Some((arg, end)) = balanced_group(text, idx) {
            out.push(arg);
            from = end;
        }
    }

    out
}
