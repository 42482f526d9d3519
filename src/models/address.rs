// file: src/models/address.rs
// description: section addresses as a top-level index or a nested 1-indexed path
// reference: https://serde.rs/enum-representations.html#untagged

use crate::error::{Result, XplorerError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SectionAddress {
    TopLevel(i64),
    Path(Vec<i64>),
}

impl SectionAddress {
    /// Validated 1-indexed segments; rejects empty paths and non-positive indices.
    pub fn segments(&self) -> Result<Vec<usize>> {
        let raw: &[i64] = match self {
            Self::TopLevel(index) => std::slice::from_ref(index),
            Self::Path(path) => path,
        };

        if raw.is_empty() {
            return Err(XplorerError::InvalidAddress(
                "section path must contain at least one index".to_string(),
            ));
        }

        raw.iter()
            .map(|&segment| {
                usize::try_from(segment)
                    .ok()
                    .filter(|&s| s >= 1)
                    .ok_or_else(|| {
                        XplorerError::InvalidAddress(format!(
                            "section indices are 1-based, got {} in {}",
                            segment, self
                        ))
                    })
            })
            .collect()
    }
}

impl fmt::Display for SectionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevel(index) => write!(f, "{}", index),
            Self::Path(path) => {
                let parts: Vec<String> = path.iter().map(i64::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<Vec<usize>> for SectionAddress {
    fn from(path: Vec<usize>) -> Self {
        Self::Path(path.into_iter().map(|s| s as i64).collect())
    }
}

/// Parses `3`, `3.1`, `3,1` or `[3, 1]`.
impl FromStr for SectionAddress {
    type Err = XplorerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bracketed = trimmed.starts_with('[');
        let inner = trimmed.trim_start_matches('[').trim_end_matches(']');

        let parts = inner
            .split(['.', ','])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<i64>().map_err(|_| {
                    XplorerError::InvalidAddress(format!("'{}' is not a section index", p))
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        match parts.as_slice() {
            [single] if !bracketed => Ok(Self::TopLevel(*single)),
            _ => Ok(Self::Path(parts)),
        }
    }
}
