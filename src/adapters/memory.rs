//! In-process adapters. Used by tests and for wiring the pipeline without
//! infrastructure.

use crate::domain::video::ProcessingStatus;
use crate::ports::events::StatusPublisher;
use crate::ports::metadata::MetadataStore;
use crate::ports::storage::StoragePort;
use crate::ports::PortError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Object store backed by a map of key to bytes.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    failing_uploads: Arc<Mutex<HashSet<String>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        lock(&self.objects).insert(key.into(), bytes.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).cloned()
    }

    /// Make every upload to `key` fail.
    pub fn fail_upload(&self, key: impl Into<String>) {
        lock(&self.failing_uploads).insert(key.into());
    }
}

#[async_trait]
impl StoragePort for MemoryObjectStore {
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), PortError> {
        let bytes = self
            .get(key)
            .ok_or_else(|| format!("no such key: {}", key))?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, bytes).await?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), PortError> {
        if lock(&self.failing_uploads).contains(key) {
            return Err(format!("upload rejected: {}", key).into());
        }
        let bytes = tokio::fs::read(local_path).await?;
        self.insert(key, bytes);
        Ok(())
    }
}

/// Metadata store backed by an ordered map.
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    history: Arc<Mutex<Vec<(String, String)>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values currently stored under keys starting with `prefix`.
    pub fn values_with_prefix(&self, prefix: &str) -> Vec<String> {
        lock(&self.entries)
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Every write in order, including overwritten ones.
    pub fn history(&self) -> Vec<(String, String)> {
        lock(&self.history).clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), PortError> {
        if *lock(&self.unavailable) {
            return Err("metadata store unavailable".into());
        }
        lock(&self.entries).insert(key.to_string(), value.to_string());
        lock(&self.history).push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        if *lock(&self.unavailable) {
            return Err("metadata store unavailable".into());
        }
        Ok(lock(&self.entries).get(key).cloned())
    }
}

/// Records every published status.
#[derive(Clone, Default)]
pub struct MemoryStatusPublisher {
    published: Arc<Mutex<Vec<ProcessingStatus>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MemoryStatusPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<ProcessingStatus> {
        lock(&self.published).clone()
    }

    /// Published statuses for one video, in publish order.
    pub fn published_for(&self, video_id: &str) -> Vec<ProcessingStatus> {
        lock(&self.published)
            .iter()
            .filter(|s| s.video_id == video_id)
            .cloned()
            .collect()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }
}

#[async_trait]
impl StatusPublisher for MemoryStatusPublisher {
    async fn publish_status(&self, status: &ProcessingStatus) -> Result<(), PortError> {
        if *lock(&self.unavailable) {
            return Err("status channel unavailable".into());
        }
        lock(&self.published).push(status.clone());
        Ok(())
    }
}

// A poisoned lock only means another holder panicked; the map is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
