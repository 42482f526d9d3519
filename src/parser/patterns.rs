// file: src/parser/patterns.rs
// description: compiled regex patterns for markers, headings and bibliography entries
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Inline markers emitted into section text
    pub static ref CITATION_MARKER: Regex = Regex::new(
        r"^<cit\.\s*([^>]+)>$"
    ).expect("CITATION_MARKER regex is valid");

    // Numbering prefixes such as "3.2.1 ", "A. " or "B.2 "
    pub static ref NUMBERED_TITLE: Regex = Regex::new(
        r"^(?:\d+(?:\.\d+)*\.?|[A-Z]\.(?:\d+(?:\.\d+)*\.?)?)\s+"
    ).expect("NUMBERED_TITLE regex is valid");

    // Markdown
    pub static ref MD_CITATION: Regex = Regex::new(
        r"\[@([^\]]+)\]"
    ).expect("MD_CITATION regex is valid");

    pub static ref BIB_ENTRY: Regex = Regex::new(
        r"^\s*\[([^\]\s]+)\]\s+(.+)$"
    ).expect("BIB_ENTRY regex is valid");

    // LaTeX
    pub static ref LATEX_COMMENT: Regex = Regex::new(
        r"(?m)(^|[^\\])%.*$"
    ).expect("LATEX_COMMENT regex is valid");

    pub static ref LATEX_HEADING: Regex = Regex::new(
        r"\\(section|subsection|subsubsection)\*?\s*\{"
    ).expect("LATEX_HEADING regex is valid");

    pub static ref LATEX_CITE: Regex = Regex::new(
        r"\\cite[a-zA-Z]*\*?(?:\[[^\]]*\])*\{([^}]+)\}"
    ).expect("LATEX_CITE regex is valid");

    pub static ref LATEX_REF: Regex = Regex::new(
        r"\\(?:eq|auto|c|C)?ref\{([^}]+)\}"
    ).expect("LATEX_REF regex is valid");

    pub static ref LATEX_LABEL: Regex = Regex::new(
        r"\\label\{([^}]+)\}"
    ).expect("LATEX_LABEL regex is valid");

    pub static ref LATEX_FIGURE_ENV: Regex = Regex::new(
        r"(?s)\\begin\{figure\*?\}(.*?)\\end\{figure\*?\}"
    ).expect("LATEX_FIGURE_ENV regex is valid");

    pub static ref LATEX_GRAPHICS: Regex = Regex::new(
        r"\\includegraphics(?:\[[^\]]*\])?\{([^}]+)\}"
    ).expect("LATEX_GRAPHICS regex is valid");

    pub static ref LATEX_BIBLIOGRAPHY: Regex = Regex::new(
        r"(?s)\\begin\{thebibliography\}(?:\{[^}]*\})?(.*?)\\end\{thebibliography\}"
    ).expect("LATEX_BIBLIOGRAPHY regex is valid");

    pub static ref LATEX_BIBITEM: Regex = Regex::new(
        r"\\bibitem(?:\[[^\]]*\])?\{([^}]+)\}"
    ).expect("LATEX_BIBITEM regex is valid");

    pub static ref LATEX_ABSTRACT: Regex = Regex::new(
        r"(?s)\\begin\{abstract\}(.*?)\\end\{abstract\}"
    ).expect("LATEX_ABSTRACT regex is valid");

    pub static ref LATEX_ENV: Regex = Regex::new(
        r"\\(?:begin|end)\{[^}]*\}(?:\[[^\]]*\])?"
    ).expect("LATEX_ENV regex is valid");

    pub static ref LATEX_FORMAT_CMD: Regex = Regex::new(
        r"\\[a-zA-Z]+\*?(?:\[[^\]]*\])?\{([^{}]*)\}"
    ).expect("LATEX_FORMAT_CMD regex is valid");

    pub static ref LATEX_BARE_CMD: Regex = Regex::new(
        r"\\[a-zA-Z]+\*?"
    ).expect("LATEX_BARE_CMD regex is valid");

    // Extracted plain text
    pub static ref PLAIN_HEADING: Regex = Regex::new(
        r"^(\d{1,2}(?:\.\d{1,2})*)\.?\s+(\p{Lu}[^.]*)$"
    ).expect("PLAIN_HEADING regex is valid");

    pub static ref PLAIN_CITATION: Regex = Regex::new(
        r"\[(\d+(?:\s*,\s*\d+)*)\]"
    ).expect("PLAIN_CITATION regex is valid");

    pub static ref PLAIN_FIGURE: Regex = Regex::new(
        r"^(?:Figure|Fig\.)\s+(\d+)[.:]\s*(.+)$"
    ).expect("PLAIN_FIGURE regex is valid");

    // Shared
    pub static ref INLINE_SPACE: Regex = Regex::new(
        r"[ \t]+"
    ).expect("INLINE_SPACE regex is valid");

    pub static ref BLANK_LINES: Regex = Regex::new(
        r"\n[ \t]*\n"
    ).expect("BLANK_LINES regex is valid");
}

pub fn citation_marker(key: &str) -> String {
    format!("<cit. {}>", key.trim())
}

pub fn figure_marker(label: &str, caption: &str) -> String {
    format!("<fig. {}: {}>", label, caption.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Expands a comma separated key list into one marker per key.
pub fn citation_markers(keys: &str) -> String {
    keys.split([',', ';'])
        .map(|k| k.trim().trim_start_matches('@'))
        .filter(|k| !k.is_empty())
        .map(citation_marker)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips leading section numbering from a heading.
pub fn clean_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NUMBERED_TITLE.replace(&collapsed, "").trim().to_string()
}

/// Key of a `<cit. KEY>` marker, or the input itself when it is not wrapped.
pub fn strip_citation_marker(raw: &str) -> String {
    let trimmed = raw.trim();
    CITATION_MARKER
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("3.2.1 Scaled Dot-Product Attention"), "Scaled Dot-Product Attention");
        assert_eq!(clean_title("A. Proofs"), "Proofs");
        assert_eq!(clean_title("B.2 More  Details"), "More Details");
        assert_eq!(clean_title("A Simple Baseline"), "A Simple Baseline");
        assert_eq!(clean_title("Introduction"), "Introduction");
    }

    #[test]
    fn test_citation_markers() {
        assert_eq!(citation_markers("a, b;c"), "<cit. a> <cit. b> <cit. c>");
        assert_eq!(citation_markers("@vaswani2017"), "<cit. vaswani2017>");
        assert_eq!(strip_citation_marker("<cit. he2016>"), "he2016");
        assert_eq!(strip_citation_marker("he2016"), "he2016");
    }

    #[test]
    fn test_plain_heading() {
        let caps = PLAIN_HEADING.captures("3.1 Period Finding").unwrap();
        assert_eq!(&caps[1], "3.1");
        assert_eq!(&caps[2], "Period Finding");
        assert!(PLAIN_HEADING.captures("1998 was a good year.").is_none());
        assert!(PLAIN_HEADING.captures("2. We show that this holds.").is_none());
    }

    #[test]
    fn test_latex_comment_keeps_escaped_percent() {
        let cleaned = LATEX_COMMENT.replace_all("50\\% accuracy % hidden\nnext", "$1");
        assert_eq!(cleaned, "50\\% accuracy \nnext");
    }

    #[test]
    fn test_figure_marker() {
        assert_eq!(figure_marker("arch", "The  model\narchitecture"), "<fig. arch: The model architecture>");
    }
}
