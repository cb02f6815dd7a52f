//! Adapters - Concrete implementations of ports.

pub mod http;
pub mod memory;
pub mod metrics;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "local")]
pub mod local;
