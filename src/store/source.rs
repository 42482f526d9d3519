// file: src/store/source.rs
// description: paper source providers and the directory-backed implementation
// reference: https://docs.rs/walkdir

use crate::config::PipelineConfig;
use crate::error::{Result, XplorerError};
use crate::models::{PaperId, SourceKind};
use crate::parser::detect_kind;
use crate::utils::Validator;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SOURCE_EXTENSIONS: &[&str] = &["md", "markdown", "tex", "txt"];

#[derive(Debug, Clone)]
pub struct PaperSource {
    pub id: PaperId,
    pub kind: SourceKind,
    pub content: String,
    pub content_hash: String,
}

impl PaperSource {
    pub fn new(id: PaperId, kind: SourceKind, content: String) -> Self {
        let content_hash = compute_hash(&content);
        Self {
            id,
            kind,
            content,
            content_hash,
        }
    }
}

pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Where raw paper text comes from.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Raw source for `id`; `PaperNotFound` when no source exists.
    async fn fetch(&self, id: &PaperId) -> Result<PaperSource>;

    /// Every paper this provider can serve.
    async fn list(&self) -> Result<Vec<PaperId>>;
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub id: PaperId,
    pub path: PathBuf,
    pub size: u64,
}

/// Papers stored as `<sanitized id>.<md|tex|txt>` anywhere under a root directory.
pub struct DirectorySource {
    root: PathBuf,
    config: PipelineConfig,
    files: RwLock<HashMap<PaperId, ScannedFile>>,
}

impl DirectorySource {
    pub fn open(root: &Path, config: PipelineConfig) -> Result<Self> {
        let source = Self {
            root: root.to_path_buf(),
            config,
            files: RwLock::new(HashMap::new()),
        };
        source.rescan()?;
        Ok(source)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuilds the id to path map from disk.
    pub fn rescan(&self) -> Result<usize> {
        let scanned = self.scan_directory()?;
        let count = scanned.len();
        let mut files = self
            .files
            .write()
            .map_err(|_| XplorerError::Unavailable("source index lock poisoned".to_string()))?;
        *files = scanned.into_iter().map(|f| (f.id.clone(), f)).collect();
        Ok(count)
    }

    fn scan_directory(&self) -> Result<Vec<ScannedFile>> {
        Validator::validate_directory(&self.root)?;

        info!("Scanning paper sources in {}", self.root.display());
        let max_size = (self.config.max_file_size_mb * 1024 * 1024) as u64;
        let mut files: Vec<ScannedFile> = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.should_skip(path) {
                debug!("Skipping file: {}", path.display());
                continue;
            }

            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !SOURCE_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = match PaperId::from_sanitized(stem) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Ignoring {}: {}", path.display(), e);
                    continue;
                }
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > max_size {
                debug!(
                    "Skipping large file ({} MB): {}",
                    size / 1024 / 1024,
                    path.display()
                );
                continue;
            }

            if files.iter().any(|f| f.id == id) {
                warn!("Duplicate source for {}, keeping the first", id);
                continue;
            }

            files.push(ScannedFile {
                id,
                path: path.to_path_buf(),
                size,
            });
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        info!("Found {} paper sources", files.len());
        Ok(files)
    }

    fn should_skip(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.config.skip_patterns {
            if pattern.contains('*') {
                let pattern_without_star = pattern.replace("*.", ".");
                if path_str.ends_with(&pattern_without_star) {
                    return true;
                }
            } else if path_str.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }

    fn lookup(&self, id: &PaperId) -> Result<Option<ScannedFile>> {
        let files = self
            .files
            .read()
            .map_err(|_| XplorerError::Unavailable("source index lock poisoned".to_string()))?;
        Ok(files.get(id).cloned())
    }
}

#[async_trait]
impl SourceProvider for DirectorySource {
    async fn fetch(&self, id: &PaperId) -> Result<PaperSource> {
        let file = self
            .lookup(id)?
            .ok_or_else(|| XplorerError::PaperNotFound(id.to_string()))?;

        let content = tokio::fs::read_to_string(&file.path)
            .await
            .map_err(|source| XplorerError::FileOperation {
                path: file.path.clone(),
                source,
            })?;

        let kind = detect_kind(Some(&file.path), &content);
        Ok(PaperSource::new(id.clone(), kind, content))
    }

    async fn list(&self) -> Result<Vec<PaperId>> {
        let files = self
            .files
            .read()
            .map_err(|_| XplorerError::Unavailable("source index lock poisoned".to_string()))?;
        let mut ids: Vec<PaperId> = files.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pipeline_config(skip: Vec<&str>) -> PipelineConfig {
        PipelineConfig {
            parallel_workers: 1,
            skip_patterns: skip.into_iter().map(String::from).collect(),
            max_file_size_mb: 1,
        }
    }

    #[tokio::test]
    async fn test_scan_and_fetch() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("physics")).unwrap();
        fs::write(temp.path().join("1706_03762.md"), "# Intro\n\ntext").unwrap();
        fs::write(temp.path().join("physics/quant-ph_9802065.txt"), "1 Intro\ntext").unwrap();
        fs::write(temp.path().join("notes.md"), "not a paper").unwrap();
        fs::write(temp.path().join("1512_03385.png"), "binary").unwrap();

        let source = DirectorySource::open(temp.path(), pipeline_config(vec![])).unwrap();
        let ids: Vec<String> = source
            .list()
            .await
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["1706.03762", "quant-ph/9802065"]);

        let paper = source
            .fetch(&PaperId::parse("quant-ph/9802065").unwrap())
            .await
            .unwrap();
        assert_eq!(paper.kind, SourceKind::PlainText);
        assert_eq!(paper.content_hash, compute_hash("1 Intro\ntext"));
    }

    #[tokio::test]
    async fn test_unknown_paper_is_not_found() {
        let temp = TempDir::new().unwrap();
        let source = DirectorySource::open(temp.path(), pipeline_config(vec![])).unwrap();
        let result = source.fetch(&PaperId::parse("1706.03762").unwrap()).await;
        assert!(matches!(result, Err(XplorerError::PaperNotFound(_))));
    }

    #[test]
    fn test_skip_patterns() {
        let temp = TempDir::new().unwrap();
        let source =
            DirectorySource::open(temp.path(), pipeline_config(vec!["*.zip", "drafts/"])).unwrap();

        assert!(source.should_skip(Path::new("paper.zip")));
        assert!(source.should_skip(Path::new("drafts/1706_03762.md")));
        assert!(!source.should_skip(Path::new("1706_03762.md")));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(DirectorySource::open(&missing, pipeline_config(vec![])).is_err());
    }
}
