use super::PortError;
use async_trait::async_trait;

/// Key-value metadata store. Keys and values are plain strings; values written
/// by the pipeline are JSON documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Write `value` at `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> Result<(), PortError>;

    /// Read the value at `key`
    async fn get(&self, key: &str) -> Result<Option<String>, PortError>;
}
