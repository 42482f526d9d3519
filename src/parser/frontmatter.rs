// file: src/parser/frontmatter.rs
// description: YAML frontmatter carrying paper metadata for any source format
// reference: https://docs.rs/yaml-rust

use crate::error::{Result, XplorerError};
use std::collections::HashMap;
use yaml_rust::{Yaml, YamlLoader};

pub struct FrontmatterParser;

#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    pub fields: HashMap<String, String>,
    pub lists: HashMap<String, Vec<String>>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// A YAML sequence, or a scalar split on `;` / ` and `.
    pub fn list(&self, key: &str) -> Vec<String> {
        if let Some(items) = self.lists.get(key) {
            return items.clone();
        }

        self.get(key)
            .map(|raw| {
                raw.split(';')
                    .flat_map(|part| part.split(" and "))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn scalar(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) | Yaml::Real(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

impl FrontmatterParser {
    pub fn new() -> Self {
        Self
    }

    /// Splits a leading `---` block from the body. `Ok(None)` when absent.
    pub fn extract(&self, content: &str) -> Result<Option<(Frontmatter, String)>> {
        if !content.starts_with("---") {
            return Ok(None);
        }

        let parts: Vec<&str> = content.splitn(3, "---").collect();

        if parts.len() < 3 {
            return Ok(None);
        }

        let yaml_content = parts[1].trim();
        let remaining_content = parts[2].trim_start_matches(['\r', '\n']);

        let docs = YamlLoader::load_from_str(yaml_content)
            .map_err(|e| XplorerError::Serialization(format!("YAML frontmatter: {}", e)))?;

        if docs.is_empty() {
            return Ok(None);
        }

        let mut frontmatter = Frontmatter::default();

        if let Yaml::Hash(hash) = &docs[0] {
            for (key, value) in hash {
                let Yaml::String(k) = key else { continue };
                match value {
                    Yaml::Array(items) => {
                        let values = items.iter().filter_map(scalar).collect();
                        frontmatter.lists.insert(k.clone(), values);
                    }
                    other => {
                        if let Some(v) = scalar(other) {
                            frontmatter.fields.insert(k.clone(), v);
                        }
                    }
                }
            }
        }

        Ok(Some((frontmatter, remaining_content.to_string())))
    }
}

impl Default for FrontmatterParser {
    fn default() -> Self {
        Self::new()
    }
}
