//! Filesystem object store for the monolith: keys map to files under one root.

use crate::ports::storage::StoragePort;
use crate::ports::PortError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FsAdapter {
    root: PathBuf,
}

impl FsAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of `key` under the root. Keys are relative, slash separated,
    /// and may not climb out of the root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PortError> {
        let relative = Path::new(key);
        if key.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(format!("invalid object key: {:?}", key).into());
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StoragePort for FsAdapter {
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), PortError> {
        let source = self.path_for(key)?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, local_path)
            .await
            .map_err(|e| format!("{}: {}", source.display(), e))?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), PortError> {
        let destination = self.path_for(key)?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &destination).await?;
        Ok(())
    }
}
