//! Scratch workspace holding the two checkouts of a sync run

use crate::core::config::SyncConfig;
use crate::core::error::SyncError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Paths of one sync run: the scratch root and the two checkouts inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    source: PathBuf,
    dest: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, source_dir: &str, dest_dir: &str) -> Self {
        let root = root.into();
        Self {
            source: root.join(source_dir),
            dest: root.join(dest_dir),
            root,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.workspace, &config.source_dir, &config.dest_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wiki checkout
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Pages checkout
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Remove the workspace if present and create it empty
    pub async fn recreate(&self) -> Result<(), SyncError> {
        if self.root.parent().is_none() {
            return Err(self.error("refusing to recreate a filesystem root"));
        }

        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.error(e)),
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| self.error(e))
    }

    fn error(&self, message: impl ToString) -> SyncError {
        SyncError::WorkspaceError {
            path: self.root.clone(),
            message: message.to_string(),
        }
    }
}
