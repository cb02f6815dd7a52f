//! Upload events and status events over Redis lists.

use super::error::RedisAdapterError;
use super::pool::RedisPool;
use super::StatusEnvelope;
use crate::domain::video::{ProcessingStatus, UploadEvent};
use crate::ports::events::{StatusPublisher, UploadEventSource};
use crate::ports::PortError;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;

#[async_trait]
impl UploadEventSource for RedisPool {
    async fn next_event(&self, timeout_secs: f64) -> Result<Option<UploadEvent>, PortError> {
        let mut conn = self.pool.get().await.map_err(RedisAdapterError::from)?;
        let result: Option<(String, String)> = conn
            .brpop(&self.upload_events_key, timeout_secs)
            .await
            .map_err(RedisAdapterError::from)?;
        match result {
            Some((_, json)) => Ok(Some(
                serde_json::from_str(&json).map_err(RedisAdapterError::from)?,
            )),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StatusPublisher for RedisPool {
    async fn publish_status(&self, status: &ProcessingStatus) -> Result<(), PortError> {
        let mut conn = self.pool.get().await.map_err(RedisAdapterError::from)?;
        let json = serde_json::to_string(&StatusEnvelope {
            key: &status.video_id,
            value: status,
        })
        .map_err(RedisAdapterError::from)?;
        conn.lpush::<_, _, ()>(&self.status_events_key, json)
            .await
            .map_err(RedisAdapterError::from)?;
        Ok(())
    }
}
