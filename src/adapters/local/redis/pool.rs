//! Redis connection pool.

use super::error::RedisAdapterError;
use deadpool_redis::{Config, Pool, Runtime};

/// Redis-backed adapter for the event lists and the metadata keyspace.
#[derive(Clone)]
pub struct RedisPool {
    pub(super) pool: Pool,
    pub(super) upload_events_key: String,
    pub(super) status_events_key: String,
}

impl RedisPool {
    /// Create a new RedisPool with connection pool.
    pub fn new(
        redis_url: &str,
        upload_events_key: impl Into<String>,
        status_events_key: impl Into<String>,
    ) -> Result<Self, RedisAdapterError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self {
            pool,
            upload_events_key: upload_events_key.into(),
            status_events_key: status_events_key.into(),
        })
    }
}
