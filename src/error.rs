// file: src/error.rs
// description: error taxonomy for lookups, navigation and search plus result alias
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, XplorerError>;

#[derive(Error, Debug)]
pub enum XplorerError {
    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Section {address} not found in paper {paper_id}")]
    SectionNotFound { paper_id: String, address: String },

    #[error("Citation '{marker}' not found in paper {paper_id}")]
    CitationNotFound { paper_id: String, marker: String },

    #[error("Figure '{label}' not found in paper {paper_id}")]
    FigureNotFound { paper_id: String, label: String },

    #[error("Paper {0} does not support reading citations")]
    CitationUnsupported(String),

    #[error("Invalid section address: {0}")]
    InvalidAddress(String),

    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl XplorerError {
    /// Transient conditions a caller may retry; everything else is deterministic.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::RateLimited(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaperNotFound(_) => "paper_not_found",
            Self::SectionNotFound { .. } => "section_not_found",
            Self::CitationNotFound { .. } => "citation_not_found",
            Self::FigureNotFound { .. } => "figure_not_found",
            Self::CitationUnsupported(_) => "citation_unsupported",
            Self::InvalidAddress(_) => "invalid_address",
            Self::Unavailable(_) => "unavailable",
            Self::RateLimited(_) => "rate_limited",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::Embedding(_) => "embedding",
            Self::FileOperation { .. } | Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for XplorerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_split() {
        assert!(XplorerError::Unavailable("timeout".into()).is_retriable());
        assert!(XplorerError::RateLimited("429".into()).is_retriable());
        assert!(!XplorerError::PaperNotFound("x".into()).is_retriable());
        assert!(!XplorerError::CitationUnsupported("x".into()).is_retriable());
    }

    #[test]
    fn test_kinds_distinguish_not_found_from_unsupported() {
        let missing = XplorerError::CitationNotFound {
            paper_id: "1706.03762".into(),
            marker: "foo".into(),
        };
        let unsupported = XplorerError::CitationUnsupported("1706.03762".into());
        assert_ne!(missing.kind(), unsupported.kind());
    }
}
