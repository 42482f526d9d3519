// file: src/index/persistence.rs
// description: json persistence for corpus snapshots with embedding model checks
// reference: https://docs.rs/serde_json

use super::snapshot::{CorpusSnapshot, SnapshotFile};
use crate::error::{Result, XplorerError};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

pub struct SnapshotStore {
    storage_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// `Ok(None)` when nothing has been saved yet. A snapshot embedded with a
    /// different model is a configuration error, not something to search.
    pub async fn load(&self, expected_model: &str) -> Result<Option<CorpusSnapshot>> {
        if !self.storage_path.exists() {
            debug!("No corpus snapshot at {:?}", self.storage_path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.storage_path)
            .await
            .map_err(|source| XplorerError::FileOperation {
                path: self.storage_path.clone(),
                source,
            })?;

        let file: SnapshotFile = serde_json::from_str(&contents)?;
        if file.model != expected_model {
            return Err(XplorerError::Config(format!(
                "snapshot {:?} was built with embedding model '{}' but '{}' is configured; run ingest again",
                self.storage_path, file.model, expected_model
            )));
        }

        let snapshot = CorpusSnapshot::from_file(file);
        info!(
            "Loaded corpus snapshot with {} papers (built {})",
            snapshot.len(),
            snapshot.built_at().format("%Y-%m-%d %H:%M:%S")
        );
        Ok(Some(snapshot))
    }

    /// Writes to a sibling temp file and renames it over the old snapshot so
    /// readers never see a half-written file.
    pub async fn save(&self, snapshot: &CorpusSnapshot) -> Result<()> {
        if let Some(parent) = self.storage_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| XplorerError::FileOperation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let contents = serde_json::to_string(&snapshot.to_file())?;
        let temp_path = self.storage_path.with_extension("json.tmp");

        fs::write(&temp_path, contents)
            .await
            .map_err(|source| XplorerError::FileOperation {
                path: temp_path.clone(),
                source,
            })?;
        fs::rename(&temp_path, &self.storage_path)
            .await
            .map_err(|source| XplorerError::FileOperation {
                path: self.storage_path.clone(),
                source,
            })?;

        debug!("Saved corpus snapshot with {} papers", snapshot.len());
        Ok(())
    }
}
