//! # Directory Gateway
//!
//! One `<workflow-id>.json` file per workflow in a single directory.
//! `WorkflowId` admits only `[A-Za-z0-9_-]`, so a key can never escape the
//! directory.

use crate::gateway::PersistenceGateway;
use crate::{PathwayError, WorkflowId};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// A gateway writing plain JSON files.
#[derive(Debug, Clone)]
pub struct DirectoryGateway {
    root: PathBuf,
}

impl DirectoryGateway {
    /// Use `root` as the document directory, creating it if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, PathwayError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| PathwayError::IoError(e.to_string()))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &WorkflowId) -> PathBuf {
        self.root.join(format!("{}.{}", id, EXTENSION))
    }
}

impl PersistenceGateway for DirectoryGateway {
    fn load(&self, id: &WorkflowId) -> Result<String, PathwayError> {
        fs::read_to_string(self.path_for(id)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PathwayError::WorkflowNotFound(id.to_string()),
            _ => PathwayError::IoError(e.to_string()),
        })
    }

    fn save(&mut self, id: &WorkflowId, json: &str) -> Result<(), PathwayError> {
        // Write then rename, so readers see the old or the new file, never half
        let target = self.path_for(id);
        let staging = self.root.join(format!(".{}.{}.tmp", id, EXTENSION));
        fs::write(&staging, json).map_err(|e| PathwayError::IoError(e.to_string()))?;
        fs::rename(&staging, &target).map_err(|e| PathwayError::IoError(e.to_string()))
    }

    fn list(&self) -> Result<Vec<WorkflowId>, PathwayError> {
        let entries = fs::read_dir(&self.root).map_err(|e| PathwayError::IoError(e.to_string()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| PathwayError::IoError(e.to_string()))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            // Foreign file names are skipped, not reported
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| WorkflowId::parse(stem).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
