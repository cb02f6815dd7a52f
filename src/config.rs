//! Configuration for different deployment environments.
//!
//! Every loader reads through a lookup function; `from_env` wires it to the
//! process environment after loading `.env`.

use crate::domain::av::TranscodeSettings;
use crate::domain::placement::{ChecksumSelector, PlacementError};
use crate::domain::video::QualityTier;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} env var required")]
    Missing { name: &'static str },
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn string_or<F>(lookup: &F, name: &'static str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).unwrap_or_else(|| default.to_string())
}

#[cfg(feature = "aws")]
fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or(ConfigError::Missing { name })
}

fn parsed_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

fn list<F>(lookup: &F, name: &'static str, default: &str) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    string_or(lookup, name, default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

const DEFAULT_TIERS: &str =
    "1080p:5000k:libx264,720p:2500k:libx264,480p:1000k:libx264,360p:500k:libx264";
const DEFAULT_NODES: &str = "node-1,node-2,node-3,node-4";

/// Settings shared by every deployment.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Root of the per-video working directories
    pub work_dir: PathBuf,
    /// Runs allowed in flight at once
    pub max_concurrent_jobs: usize,
    /// Storage node identifiers for segment placement
    pub storage_nodes: Vec<String>,
    /// Quality ladder, in attempt order
    pub quality_tiers: Vec<QualityTier>,
    pub segment_seconds: u32,
    pub ffmpeg_path: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Deadline applied to each metadata-store call
    pub metadata_timeout: Duration,
    /// Events buffered between submitters and the ingest loop
    pub ingest_queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/video-processing"),
            max_concurrent_jobs: 5,
            storage_nodes: DEFAULT_NODES.split(',').map(String::from).collect(),
            quality_tiers: QualityTier::default_ladder(),
            segment_seconds: 10,
            ffmpeg_path: "ffmpeg".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            metadata_timeout: Duration::from_secs(5),
            ingest_queue_capacity: 64,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_concurrent_jobs: usize = parsed_or(&lookup, "MAX_CONCURRENT_JOBS", 5)?;
        if max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_CONCURRENT_JOBS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let storage_nodes = list(&lookup, "STORAGE_NODES", DEFAULT_NODES);
        if storage_nodes.is_empty() {
            return Err(ConfigError::Invalid {
                name: "STORAGE_NODES",
                value: lookup("STORAGE_NODES").unwrap_or_default(),
                reason: PlacementError::NoNodes.to_string(),
            });
        }

        let quality_tiers = list(&lookup, "QUALITY_TIERS", DEFAULT_TIERS)
            .iter()
            .map(|raw| {
                raw.parse::<QualityTier>()
                    .map_err(|e| ConfigError::Invalid {
                        name: "QUALITY_TIERS",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if quality_tiers.is_empty() {
            return Err(ConfigError::Invalid {
                name: "QUALITY_TIERS",
                value: String::new(),
                reason: "at least one tier is required".to_string(),
            });
        }

        let segment_seconds: u32 = parsed_or(&lookup, "SEGMENT_SECONDS", 10)?;
        if segment_seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "SEGMENT_SECONDS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let metadata_timeout_secs: u64 = parsed_or(&lookup, "METADATA_TIMEOUT_SECS", 5)?;
        if metadata_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "METADATA_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            work_dir: PathBuf::from(string_or(&lookup, "TEMP_DIR", "/tmp/video-processing")),
            max_concurrent_jobs,
            storage_nodes,
            quality_tiers,
            segment_seconds,
            ffmpeg_path: string_or(&lookup, "FFMPEG_PATH", "ffmpeg"),
            audio_codec: string_or(&lookup, "AUDIO_CODEC", "aac"),
            audio_bitrate: string_or(&lookup, "AUDIO_BITRATE", "128k"),
            metadata_timeout: Duration::from_secs(metadata_timeout_secs),
            ingest_queue_capacity: parsed_or(&lookup, "INGEST_QUEUE_CAPACITY", 64)?,
        })
    }

    pub fn transcode_settings(&self) -> TranscodeSettings {
        TranscodeSettings {
            ffmpeg_path: self.ffmpeg_path.clone(),
            segment_seconds: self.segment_seconds,
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
        }
    }

    pub fn node_selector(&self) -> Result<ChecksumSelector, PlacementError> {
        ChecksumSelector::new(self.storage_nodes.clone())
    }
}

/// Configuration for local/monolith deployment.
#[cfg(feature = "local")]
#[derive(Clone, Debug)]
pub struct LocalConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Redis connection URL
    pub redis_url: String,
    /// Root directory of the filesystem object store
    pub storage_dir: PathBuf,
    /// Redis list carrying upload events
    pub upload_events_key: String,
    /// Redis list receiving status events
    pub status_events_key: String,
    pub pipeline: PipelineConfig,
}

#[cfg(feature = "local")]
impl LocalConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            addr: string_or(&lookup, "ADDR", "127.0.0.1"),
            port: string_or(&lookup, "PORT", "8081"),
            redis_url: string_or(&lookup, "REDIS_URL", "redis://127.0.0.1/"),
            storage_dir: PathBuf::from(string_or(&lookup, "STORAGE_DIR", "./storage")),
            upload_events_key: string_or(&lookup, "UPLOAD_EVENTS_KEY", "video-upload-events"),
            status_events_key: string_or(&lookup, "STATUS_EVENTS_KEY", "video-processing-status"),
            pipeline: PipelineConfig::from_lookup(&lookup)?,
        })
    }
}

/// Configuration for AWS deployment.
#[cfg(feature = "aws")]
#[derive(Clone, Debug)]
pub struct AwsConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// S3 bucket for sources and renditions
    pub s3_bucket: String,
    /// SQS queue URL carrying upload events
    pub upload_queue_url: String,
    /// SQS queue URL receiving status events
    pub status_queue_url: String,
    /// DynamoDB table used as the metadata store
    pub dynamodb_table: String,
    pub pipeline: PipelineConfig,
}

#[cfg(feature = "aws")]
impl AwsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            addr: string_or(&lookup, "ADDR", "0.0.0.0"),
            port: string_or(&lookup, "PORT", "8081"),
            s3_bucket: required(&lookup, "S3_BUCKET")?,
            upload_queue_url: required(&lookup, "UPLOAD_QUEUE_URL")?,
            status_queue_url: required(&lookup, "STATUS_QUEUE_URL")?,
            dynamodb_table: required(&lookup, "DYNAMODB_TABLE")?,
            pipeline: PipelineConfig::from_lookup(&lookup)?,
        })
    }
}
