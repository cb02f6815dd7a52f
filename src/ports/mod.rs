//! Ports - Trait definitions for the pipeline's external collaborators.

use std::error::Error;

pub mod events;
pub mod metadata;
pub mod metrics;
pub mod storage;

/// Error type returned by every port.
pub type PortError = Box<dyn Error + Send + Sync>;
