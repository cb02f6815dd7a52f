use super::PortError;
use crate::domain::video::{ProcessingStatus, UploadEvent};
use async_trait::async_trait;

/// Inbound durable log of upload events.
#[async_trait]
pub trait UploadEventSource: Send + Sync {
    /// Wait for the next event.
    /// timeout_secs: 0.0 for infinite (or long poll), >0.0 for specific timeout
    async fn next_event(&self, timeout_secs: f64) -> Result<Option<UploadEvent>, PortError>;
}

/// Outbound channel for status snapshots, keyed by `video_id`.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish_status(&self, status: &ProcessingStatus) -> Result<(), PortError>;
}
