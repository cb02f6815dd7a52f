use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;
use thiserror::Error;

/// An uploaded source video, as carried on the upload events topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEvent {
    pub video_id: String,
    pub user_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub s3_key: String,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidEvent {
    #[error("video_id must not be empty")]
    EmptyVideoId,
    #[error("file_name must not be empty")]
    EmptyFileName,
    #[error("s3_key must not be empty")]
    EmptySourceKey,
    #[error("{field} must be a single path component: {value:?}")]
    NotAComponent { field: &'static str, value: String },
}

impl UploadEvent {
    /// Checks the fields that end up in local working paths.
    ///
    /// `video_id` and `file_name` are joined onto the working directory, so both
    /// must be one plain path component.
    pub fn validate(&self) -> Result<(), InvalidEvent> {
        if self.video_id.trim().is_empty() {
            return Err(InvalidEvent::EmptyVideoId);
        }
        if self.file_name.trim().is_empty() {
            return Err(InvalidEvent::EmptyFileName);
        }
        if self.s3_key.trim().is_empty() {
            return Err(InvalidEvent::EmptySourceKey);
        }
        for (field, value) in [("video_id", &self.video_id), ("file_name", &self.file_name)] {
            if !is_single_component(value) {
                return Err(InvalidEvent::NotAComponent {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_single_component(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// One target rendition: resolution label, video bitrate and codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTier {
    pub resolution: String,
    pub bitrate: String,
    pub codec: String,
}

impl QualityTier {
    pub fn new(
        resolution: impl Into<String>,
        bitrate: impl Into<String>,
        codec: impl Into<String>,
    ) -> Self {
        Self {
            resolution: resolution.into(),
            bitrate: bitrate.into(),
            codec: codec.into(),
        }
    }

    /// The ladder used when nothing is configured.
    pub fn default_ladder() -> Vec<QualityTier> {
        vec![
            QualityTier::new("1080p", "5000k", "libx264"),
            QualityTier::new("720p", "2500k", "libx264"),
            QualityTier::new("480p", "1000k", "libx264"),
            QualityTier::new("360p", "500k", "libx264"),
        ]
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resolution, self.bitrate, self.codec)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected resolution:bitrate:codec, got {0:?}")]
pub struct ParseTierError(pub String);

impl FromStr for QualityTier {
    type Err = ParseTierError;

    /// Parses `resolution:bitrate:codec`, e.g. `720p:2500k:libx264`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        match parts.as_slice() {
            [resolution, bitrate, codec]
                if !resolution.is_empty() && !bitrate.is_empty() && !codec.is_empty() =>
            {
                if !is_single_component(resolution) {
                    return Err(ParseTierError(s.to_string()));
                }
                Ok(QualityTier::new(*resolution, *bitrate, *codec))
            }
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingState::Completed | ProcessingState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingState::Pending => "pending",
            ProcessingState::Processing => "processing",
            ProcessingState::Completed => "completed",
            ProcessingState::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known state of one video's run. Every transition overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub video_id: String,
    pub status: ProcessingState,
    pub progress: u8,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingStatus {
    pub fn new(
        video_id: impl Into<String>,
        status: ProcessingState,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            status,
            progress: progress.min(100),
            message: message.into(),
            updated_at: Utc::now(),
        }
    }

    /// What status queries answer when no record has been written yet.
    pub fn unknown(video_id: impl Into<String>) -> Self {
        Self::new(video_id, ProcessingState::Pending, 0, "no processing record yet")
    }
}

/// One distributed chunk of a rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: String,
    pub video_id: String,
    pub quality: String,
    pub sequence: usize,
    pub duration: f64,
    pub s3_key: String,
    pub node_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> UploadEvent {
        UploadEvent {
            video_id: "v1".to_string(),
            user_id: "u1".to_string(),
            file_name: "clip.mp4".to_string(),
            file_size: 1024,
            s3_key: "uploads/u1/clip.mp4".to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_upload_event_wire_format() {
        let json = r#"{
            "video_id": "v1",
            "user_id": "u1",
            "file_name": "clip.mp4",
            "file_size": 2048,
            "s3_key": "uploads/u1/clip.mp4",
            "uploaded_at": "2024-05-01T12:00:00Z"
        }"#;
        let event: UploadEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.video_id, "v1");
        assert_eq!(event.file_size, 2048);
        assert_eq!(event.s3_key, "uploads/u1/clip.mp4");
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_traversal() {
        let mut bad = event();
        bad.video_id = "../etc".to_string();
        assert!(matches!(
            bad.validate(),
            Err(InvalidEvent::NotAComponent { field: "video_id", .. })
        ));

        let mut bad = event();
        bad.file_name = "dir/clip.mp4".to_string();
        assert!(matches!(
            bad.validate(),
            Err(InvalidEvent::NotAComponent { field: "file_name", .. })
        ));

        let mut bad = event();
        bad.video_id = "  ".to_string();
        assert_eq!(bad.validate(), Err(InvalidEvent::EmptyVideoId));
    }

    #[test]
    fn test_parse_quality_tier() {
        let tier: QualityTier = "720p:2500k:libx264".parse().unwrap();
        assert_eq!(tier, QualityTier::new("720p", "2500k", "libx264"));
        assert_eq!(tier.to_string(), "720p:2500k:libx264");

        assert!("720p:2500k".parse::<QualityTier>().is_err());
        assert!("720p::libx264".parse::<QualityTier>().is_err());
        assert!("../x:1k:libx264".parse::<QualityTier>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let status = ProcessingStatus::new("v1", ProcessingState::Completed, 100, "done");
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["progress"], 100);
        assert_eq!(value["video_id"], "v1");
        assert!(value.get("updated_at").is_some());
    }

    #[test]
    fn test_progress_is_capped() {
        let status = ProcessingStatus::new("v1", ProcessingState::Processing, 140, "");
        assert_eq!(status.progress, 100);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProcessingState::Completed.is_terminal());
        assert!(ProcessingState::Failed.is_terminal());
        assert!(!ProcessingState::Pending.is_terminal());
        assert!(!ProcessingState::Processing.is_terminal());
    }
}
