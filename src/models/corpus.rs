// file: src/models/corpus.rs
// description: response shapes returned by search and per-paper lookups
// reference: https://serde.rs/derive.html

use super::document::Figure;
use crate::error::XplorerError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// Term matching over titles, authors and abstracts
    Keyword,
    /// Embedding similarity between the query and title plus abstract
    Semantic,
    /// Papers closest to the paper id given as the query
    Similarity,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Similarity => "similarity",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMethod {
    type Err = XplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "semantic" => Ok(Self::Semantic),
            "similarity" => Ok(Self::Similarity),
            other => Err(XplorerError::Validation(format!(
                "unknown search method '{}', expected keyword, semantic or similarity",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub id: String,
    pub title: String,
    pub first_author: Option<String>,
    pub date: Option<String>,
    pub abstract_snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    pub authors: Vec<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    pub table_of_contents: String,
    pub can_read_citation: bool,
    pub num_figures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureView {
    pub label: String,
    pub caption: String,
    pub section: Option<String>,
    pub url: Vec<String>,
}

impl From<&Figure> for FigureView {
    fn from(figure: &Figure) -> Self {
        Self {
            label: figure.label.clone(),
            caption: figure.caption(),
            section: figure.section_title.clone(),
            url: figure.image_urls.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionView {
    pub title: String,
    pub text: String,
    pub figures: Vec<FigureView>,
}
