// file: src/resolver/figure.rs
// description: figure label resolution to caption, owning section and image urls
// reference: internal data structures

use crate::error::{Result, XplorerError};
use crate::models::{Document, FigureView};

pub struct FigureResolver;

impl FigureResolver {
    pub fn resolve(document: &Document, label: &str) -> Result<FigureView> {
        let label = label.trim();
        document
            .figures
            .get(label)
            .map(FigureView::from)
            .ok_or_else(|| XplorerError::FigureNotFound {
                paper_id: document.id.to_string(),
                label: label.to_string(),
            })
    }
}
