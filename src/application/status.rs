use crate::domain::keys::status_key;
use crate::domain::video::{ProcessingState, ProcessingStatus};
use crate::ports::events::StatusPublisher;
use crate::ports::metadata::MetadataStore;
use crate::ports::PortError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Persists and announces processing status. Reporting never fails the run it
/// describes: errors are logged and dropped.
#[derive(Clone)]
pub struct StatusTracker {
    metadata: Arc<dyn MetadataStore>,
    publisher: Arc<dyn StatusPublisher>,
    deadline: Duration,
}

impl StatusTracker {
    pub fn new(metadata: Arc<dyn MetadataStore>, publisher: Arc<dyn StatusPublisher>) -> Self {
        Self {
            metadata,
            publisher,
            deadline: DEFAULT_METADATA_TIMEOUT,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Snapshot the status now, write it at `/processing-status/{video_id}` and
    /// emit it. Returns the snapshot whatever happened downstream.
    pub async fn update(
        &self,
        video_id: &str,
        state: ProcessingState,
        progress: u8,
        message: impl Into<String>,
    ) -> ProcessingStatus {
        let status = ProcessingStatus::new(video_id, state, progress, message);
        self.record(&status).await;
        status
    }

    pub async fn record(&self, status: &ProcessingStatus) {
        match serde_json::to_string(status) {
            Ok(json) => {
                let key = status_key(&status.video_id);
                let persisted =
                    put_with_deadline(self.metadata.as_ref(), &key, &json, self.deadline).await;
                if let Err(e) = persisted {
                    tracing::warn!(
                        video_id = %status.video_id,
                        error = %e,
                        "failed to persist status"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(video_id = %status.video_id, error = %e, "failed to encode status");
            }
        }

        if let Err(e) = self.publisher.publish_status(status).await {
            tracing::warn!(video_id = %status.video_id, error = %e, "failed to publish status");
        }

        tracing::info!(
            video_id = %status.video_id,
            status = %status.status,
            progress = status.progress,
            message = %status.message,
            "status updated"
        );
    }

    /// Latest persisted status, if any.
    pub async fn current(&self, video_id: &str) -> Result<Option<ProcessingStatus>, PortError> {
        let key = status_key(video_id);
        let value = timeout(self.deadline, self.metadata.get(&key))
            .await
            .map_err(|_| format!("metadata get {} timed out after {:?}", key, self.deadline))??;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// One metadata write bounded by `deadline`.
pub async fn put_with_deadline(
    store: &dyn MetadataStore,
    key: &str,
    value: &str,
    deadline: Duration,
) -> Result<(), PortError> {
    timeout(deadline, store.put(key, value))
        .await
        .map_err(|_| format!("metadata put {} timed out after {:?}", key, deadline))?
}
