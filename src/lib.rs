//! vodpipe - Transcode-and-distribute pipeline for uploaded videos
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (videos, placement, HLS, ffmpeg renditions)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations
//! - application/: Pipeline services that use ports
//! - config: Environment configuration
//!
//! # Features
//! - `local`: Local/monolith deployment (Redis, filesystem object store, HTTP API)
//! - `aws`: AWS deployment (S3, SQS, DynamoDB)
//! - `full`: All features

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

// Re-exports for convenience
pub use application::ingest::{Dispatcher, Ingestor};
pub use application::pipeline::Pipeline;
pub use config::PipelineConfig;
pub use domain::video::{ProcessingState, ProcessingStatus, QualityTier, Segment, UploadEvent};

#[cfg(feature = "aws")]
pub use config::AwsConfig;

#[cfg(feature = "local")]
pub use config::LocalConfig;
