//! Domain layer - Pure business logic.

// ffmpeg-driven HLS renditions
pub mod av;

// Playlist parsing
pub mod hls;

pub mod keys;
pub mod placement;
pub mod video;
