//! Observability sink injected into pipeline components.

pub const VIDEO_PROCESSING_TOTAL: &str = "video_processing_total";
pub const VIDEO_PROCESSING_DURATION: &str = "video_processing_duration_seconds";
pub const FFMPEG_FAILURES: &str = "ffmpeg_processing_failures_total";
pub const SEGMENTS_CREATED: &str = "video_segments_created_total";
pub const STORAGE_UPLOAD_DURATION: &str = "storage_upload_duration_seconds";

pub type Labels<'a> = &'a [(&'static str, &'a str)];

pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &'static str, labels: Labels<'_>);

    fn observe(&self, name: &'static str, labels: Labels<'_>, value: f64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _name: &'static str, _labels: Labels<'_>) {}

    fn observe(&self, _name: &'static str, _labels: Labels<'_>, _value: f64) {}
}
