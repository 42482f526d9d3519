// file: src/models/paper_id.rs
// description: arXiv-style paper identifiers with url and version normalization
// reference: https://info.arxiv.org/help/arxiv_identifier.html

use crate::error::{Result, XplorerError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref PAPER_ID: Regex = Regex::new(
        r"^(?:https?://(?:www\.)?arxiv\.org/(?:abs|pdf)/)?((?:[A-Za-z][A-Za-z.-]*/\d{7})|(?:\d{4}\.\d{4,5}))(?:v\d+)?(?:\.pdf)?/?$"
    ).expect("PAPER_ID regex is valid");

    static ref SANITIZED_NEW_STYLE: Regex =
        Regex::new(r"^(\d{4})_(\d{4,5})$").expect("SANITIZED_NEW_STYLE regex is valid");

    static ref SANITIZED_OLD_STYLE: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z_-]*)_(\d{7})$").expect("SANITIZED_OLD_STYLE regex is valid");
}

/// Version-less arXiv identifier, e.g. `1706.03762` or `quant-ph/9802065`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaperId(String);

impl PaperId {
    /// Accepts bare ids, versioned ids and arxiv.org abs/pdf urls.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        PAPER_ID
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| XplorerError::PaperNotFound(trimmed.to_string()))
    }

    /// Inverse of [`PaperId::sanitized`], used to recover ids from file stems.
    pub fn from_sanitized(stem: &str) -> Result<Self> {
        if let Some(caps) = SANITIZED_NEW_STYLE.captures(stem) {
            return Ok(Self(format!("{}.{}", &caps[1], &caps[2])));
        }

        if let Some(caps) = SANITIZED_OLD_STYLE.captures(stem) {
            let archive = caps[1].replace('_', ".");
            return Ok(Self(format!("{}/{}", archive, &caps[2])));
        }

        Err(XplorerError::Validation(format!(
            "File stem '{}' does not encode a paper id",
            stem
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe form: `/` and `.` become `_`.
    pub fn sanitized(&self) -> String {
        self.0.replace(['/', '.'], "_")
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PaperId {
    type Err = XplorerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PaperId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PaperId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        for raw in [
            "1706.03762",
            "1706.03762v5",
            " https://arxiv.org/abs/1706.03762 ",
            "https://arxiv.org/pdf/1706.03762v2.pdf",
        ] {
            assert_eq!(PaperId::parse(raw).unwrap().as_str(), "1706.03762");
        }

        assert_eq!(
            PaperId::parse("quant-ph/9802065v1").unwrap().as_str(),
            "quant-ph/9802065"
        );
        assert_eq!(
            PaperId::parse("math.GT/0309136").unwrap().as_str(),
            "math.GT/0309136"
        );
    }

    #[test]
    fn test_invalid_ids_are_not_found() {
        for raw in ["", "demo", "https://example.com/abs/1706.03762", "17.03762"] {
            assert!(matches!(
                PaperId::parse(raw),
                Err(XplorerError::PaperNotFound(_))
            ));
        }
    }

    #[test]
    fn test_sanitize_roundtrip() {
        for raw in ["1706.03762", "quant-ph/9802065", "math.GT/0309136"] {
            let id = PaperId::parse(raw).unwrap();
            assert_eq!(PaperId::from_sanitized(&id.sanitized()).unwrap(), id);
        }
        assert_eq!(PaperId::parse("quant-ph/9802065").unwrap().sanitized(), "quant-ph_9802065");
    }
}
