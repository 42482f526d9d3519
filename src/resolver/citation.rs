// file: src/resolver/citation.rs
// description: citation marker resolution gated by the document capability flag
// reference: internal data structures

use crate::error::{Result, XplorerError};
use crate::models::Document;
use crate::parser::patterns::strip_citation_marker;

pub struct CitationResolver;

impl CitationResolver {
    /// Accepts the bare key or the full `<cit. KEY>` marker.
    pub fn resolve(document: &Document, marker: &str) -> Result<String> {
        if !document.can_read_citation {
            return Err(XplorerError::CitationUnsupported(document.id.to_string()));
        }

        let key = strip_citation_marker(marker);
        document
            .citations
            .get(&key)
            .cloned()
            .ok_or_else(|| XplorerError::CitationNotFound {
                paper_id: document.id.to_string(),
                marker: key,
            })
    }
}
