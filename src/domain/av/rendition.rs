use super::cmd::TranscodeExecutor;
use crate::domain::hls::MediaPlaylist;
use crate::domain::keys::{PLAYLIST_FILE, SEGMENT_EXTENSION};
use crate::domain::video::QualityTier;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to prepare output directory for {tier}: {source}")]
    OutputDir {
        tier: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch transcoder for {tier}: {source}")]
    Launch {
        tier: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transcoder failed for {tier} ({})", describe_exit(.code))]
    Failed {
        tier: String,
        code: Option<i32>,
        output: String,
    },
    #[error("failed to list segments for {tier}: {source}")]
    Listing {
        tier: String,
        #[source]
        source: std::io::Error,
    },
}

impl TranscodeError {
    pub fn tier(&self) -> &str {
        match self {
            TranscodeError::OutputDir { tier, .. }
            | TranscodeError::Launch { tier, .. }
            | TranscodeError::Failed { tier, .. }
            | TranscodeError::Listing { tier, .. } => tier,
        }
    }

    /// Transcoder output captured for diagnostics, when the process ran.
    pub fn output(&self) -> Option<&str> {
        match self {
            TranscodeError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Fixed encode and segmentation parameters shared by every tier.
#[derive(Debug, Clone)]
pub struct TranscodeSettings {
    pub ffmpeg_path: String,
    pub segment_seconds: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            segment_seconds: 10,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProducedSegment {
    pub path: PathBuf,
    pub duration: f64,
}

/// Local output of one tier: the playlist and its segments in sequence order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    pub resolution: String,
    pub playlist: PathBuf,
    pub segments: Vec<ProducedSegment>,
}

pub struct RenditionTranscoder {
    executor: Arc<dyn TranscodeExecutor>,
    settings: TranscodeSettings,
}

impl RenditionTranscoder {
    pub fn new(executor: Arc<dyn TranscodeExecutor>, settings: TranscodeSettings) -> Self {
        Self { executor, settings }
    }

    /// Arguments for a single-pass HLS encode of `source` into `output_dir`.
    ///
    /// `-hls_list_size 0` keeps every segment in one non-rotating playlist.
    pub fn build_args(&self, source: &Path, output_dir: &Path, tier: &QualityTier) -> Vec<String> {
        let segment_pattern = output_dir.join(format!("segment_%03d.{}", SEGMENT_EXTENSION));
        let playlist = output_dir.join(PLAYLIST_FILE);

        vec![
            "-hide_banner".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-c:v".to_string(),
            tier.codec.clone(),
            "-b:v".to_string(),
            tier.bitrate.clone(),
            "-c:a".to_string(),
            self.settings.audio_codec.clone(),
            "-b:a".to_string(),
            self.settings.audio_bitrate.clone(),
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            self.settings.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_segment_filename".to_string(),
            segment_pattern.to_string_lossy().into_owned(),
            playlist.to_string_lossy().into_owned(),
        ]
    }

    pub async fn transcode(
        &self,
        source: &Path,
        output_dir: &Path,
        tier: &QualityTier,
    ) -> Result<Rendition, TranscodeError> {
        let label = tier.resolution.clone();

        fs::create_dir_all(output_dir)
            .await
            .map_err(|source| TranscodeError::OutputDir {
                tier: label.clone(),
                source,
            })?;

        let args = self.build_args(source, output_dir, tier);
        tracing::debug!(tier = %label, args = ?args, "running transcoder");

        let output = self
            .executor
            .run(&self.settings.ffmpeg_path, &args)
            .await
            .map_err(|source| TranscodeError::Launch {
                tier: label.clone(),
                source,
            })?;

        if !output.success {
            return Err(TranscodeError::Failed {
                tier: label,
                code: output.code,
                output: output.combined,
            });
        }

        let files = list_segments(output_dir)
            .await
            .map_err(|source| TranscodeError::Listing {
                tier: label.clone(),
                source,
            })?;

        let playlist_path = output_dir.join(PLAYLIST_FILE);
        let playlist = match MediaPlaylist::read_from(&playlist_path).await {
            Ok(playlist) => Some(playlist),
            Err(e) => {
                tracing::warn!(
                    tier = %label,
                    error = %e,
                    "could not read playlist for segment durations"
                );
                None
            }
        };

        let nominal = f64::from(self.settings.segment_seconds);
        let segments = files
            .into_iter()
            .map(|path| {
                let duration = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| playlist.as_ref().and_then(|p| p.duration_of(n)))
                    .unwrap_or(nominal);
                ProducedSegment { path, duration }
            })
            .collect();

        Ok(Rendition {
            resolution: label,
            playlist: playlist_path,
            segments,
        })
    }
}

/// Segment files in `dir`, ordered by file name. Names are zero-padded, so
/// lexical order is sequence order.
pub async fn list_segments(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_segment = path
            .extension()
            .map(|ext| ext == SEGMENT_EXTENSION)
            .unwrap_or(false);
        if is_segment && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
