//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::dir::Dir;

/// On-disk layout of the deployer's local state
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// One JSON record per deployment
    pub fn deployments_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("deployments"))
    }
}

impl Default for StorageLayout {
    /// Records live next to where the tool is run
    fn default() -> Self {
        Self::new(".")
    }
}
