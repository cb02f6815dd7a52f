//! Application layer - Pipeline services that use ports.

pub mod distributor;
pub mod ingest;
pub mod pipeline;
pub mod status;

pub use distributor::{DistributionReport, SegmentDistributor};
pub use ingest::{Dispatcher, Ingestor, SubmitError};
pub use pipeline::{Pipeline, PipelineError, RunSummary, TierOutcome};
pub use status::StatusTracker;
