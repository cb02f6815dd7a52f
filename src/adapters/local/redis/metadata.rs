//! Redis MetadataStore implementation.

use super::error::RedisAdapterError;
use super::pool::RedisPool;
use crate::ports::metadata::MetadataStore;
use crate::ports::PortError;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;

#[async_trait]
impl MetadataStore for RedisPool {
    async fn put(&self, key: &str, value: &str) -> Result<(), PortError> {
        let mut conn = self.pool.get().await.map_err(RedisAdapterError::from)?;
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(RedisAdapterError::from)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        let mut conn = self.pool.get().await.map_err(RedisAdapterError::from)?;
        let value: Option<String> = conn.get(key).await.map_err(RedisAdapterError::from)?;
        Ok(value)
    }
}
