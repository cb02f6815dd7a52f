//! External transcoder invocation.

pub mod cmd;
pub mod rendition;

pub use cmd::{ProcessOutput, SystemExecutor, TranscodeExecutor};
pub use rendition::{
    ProducedSegment, Rendition, RenditionTranscoder, TranscodeError, TranscodeSettings,
};
