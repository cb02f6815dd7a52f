//! Redis adapter for local deployment.
//!
//! One pool backs three ports:
//! - `UploadEventSource`: BRPOP on the upload events list
//! - `StatusPublisher`: LPUSH of `{key, value}` envelopes on the status list
//! - `MetadataStore`: plain GET/SET

mod error;
mod events;
mod metadata;
mod pool;

pub use error::RedisAdapterError;
pub use pool::RedisPool;

use crate::domain::video::ProcessingStatus;
use serde::Serialize;

/// Status message as pushed to the status list, keyed by video id.
#[derive(Serialize)]
pub(crate) struct StatusEnvelope<'a> {
    pub key: &'a str,
    pub value: &'a ProcessingStatus,
}
