//! Deployment record store
//!
//! One pretty-printed JSON file per deployment, named `<name>.json`. Writes go
//! through a temp file and rename. There is no locking: concurrent writers to
//! the same name race and the last rename wins.

use tracing::{debug, warn};

use crate::errors::DeployError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::models::deployment::DeploymentRecord;
use crate::storage::layout::StorageLayout;

const RECORD_EXTENSION: &str = "json";

/// Persistent store of [`DeploymentRecord`]s
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: Dir,
}

impl RecordStore {
    pub fn new(dir: Dir) -> Self {
        Self { dir }
    }

    pub fn from_layout(layout: &StorageLayout) -> Self {
        Self::new(layout.deployments_dir())
    }

    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    /// Names become file names, so they must not escape the record directory
    pub fn validate_name(name: &str) -> Result<(), DeployError> {
        if name.trim().is_empty() {
            return Err(DeployError::Usage("Deployment name must not be empty".to_string()));
        }
        if name.starts_with('.') {
            return Err(DeployError::Usage(format!(
                "Deployment name must not start with '.': {}",
                name
            )));
        }
        if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
            return Err(DeployError::Usage(format!(
                "Deployment name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    fn record_file(&self, name: &str) -> Result<File, DeployError> {
        Self::validate_name(name)?;
        Ok(self.dir.file(&format!("{}.{}", name, RECORD_EXTENSION)))
    }

    /// Write a record, replacing any record with the same name
    pub async fn save(&self, record: &DeploymentRecord) -> Result<(), DeployError> {
        let file = self.record_file(&record.name)?;
        self.dir.create().await?;
        file.write_json(record).await.map_err(|e| {
            DeployError::Storage(format!(
                "Failed to save record {}: {}",
                file.path().display(),
                e
            ))
        })?;
        debug!("Saved deployment record {}", file.path().display());
        Ok(())
    }

    /// Load a record by name. The file name and the record's name must agree.
    pub async fn get(&self, name: &str) -> Result<DeploymentRecord, DeployError> {
        let file = self.record_file(name)?;
        if !file.exists().await {
            return Err(DeployError::NotFound(format!(
                "No deployment record for \"{}\"",
                name
            )));
        }
        let record: DeploymentRecord = file.read_json().await?;
        if record.name != name {
            return Err(DeployError::Storage(format!(
                "Record {} is named \"{}\"",
                file.path().display(),
                record.name
            )));
        }
        Ok(record)
    }

    /// All readable records, ordered by name. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<DeploymentRecord>, DeployError> {
        let mut records = Vec::new();

        for path in self.dir.list_files_with_extension(RECORD_EXTENSION).await? {
            match File::new(&path).read_json::<DeploymentRecord>().await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// Remove a record. Returns whether one existed.
    pub async fn remove(&self, name: &str) -> Result<bool, DeployError> {
        let removed = self.record_file(name)?.delete().await?;
        if removed {
            debug!("Removed deployment record {}", name);
        }
        Ok(removed)
    }

    /// First record pointing at the given instance
    pub async fn find_by_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<DeploymentRecord>, DeployError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|record| record.instance_id.as_deref() == Some(instance_id)))
    }
}
