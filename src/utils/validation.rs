// file: src/utils/validation.rs
// description: request and path validation helpers
// reference: input validation patterns

use crate::error::{Result, XplorerError};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(XplorerError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(XplorerError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_query(query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(XplorerError::Validation("Query is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_count(count: usize, max: usize) -> Result<()> {
        if count == 0 {
            return Err(XplorerError::Validation(
                "count must be greater than 0".to_string(),
            ));
        }

        if count > max {
            return Err(XplorerError::Validation(format!(
                "count too large (max {})",
                max
            )));
        }

        Ok(())
    }

    pub fn validate_page(page: usize) -> Result<()> {
        if page == 0 {
            return Err(XplorerError::Validation(
                "page is 1-indexed and must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_year(year: i32) -> Result<()> {
        if !(1900..=2200).contains(&year) {
            return Err(XplorerError::Validation(format!(
                "year {} is out of range",
                year
            )));
        }
        Ok(())
    }
}

/// Items of 1-indexed `page` when `items` is split into pages of `count`.
pub fn paginate<T>(items: Vec<T>, count: usize, page: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(count);
    items.into_iter().skip(start).take(count).collect()
}
