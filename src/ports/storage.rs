use super::PortError;
use async_trait::async_trait;
use std::path::Path;

/// Object store holding source uploads and distributed renditions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Download the object at `key` to a local path
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), PortError>;

    /// Upload a file from a local path to `key`
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), PortError>;
}
