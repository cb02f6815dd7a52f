use super::distributor::SegmentDistributor;
use super::status::StatusTracker;
use crate::config::PipelineConfig;
use crate::domain::av::{RenditionTranscoder, TranscodeExecutor};
use crate::domain::placement::PlacementError;
use crate::domain::video::{ProcessingState, QualityTier, UploadEvent};
use crate::ports::events::StatusPublisher;
use crate::ports::metadata::MetadataStore;
use crate::ports::metrics::{
    MetricsSink, FFMPEG_FAILURES, VIDEO_PROCESSING_DURATION, VIDEO_PROCESSING_TOTAL,
};
use crate::ports::storage::StoragePort;
use crate::ports::PortError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub const DOWNLOADED_PROGRESS: u8 = 10;
const SOURCE_DIR: &str = "source";
const RENDITIONS_DIR: &str = "renditions";
const TRANSCODE_PROGRESS_SPAN: usize = 80;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to prepare working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download video: {source}")]
    Download {
        key: String,
        #[source]
        source: PortError,
    },
}

/// What happened to one tier of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome {
    Distributed {
        resolution: String,
        segments: usize,
        skipped: usize,
        playlist_uploaded: bool,
    },
    Failed {
        resolution: String,
        error: String,
    },
}

impl TierOutcome {
    pub fn resolution(&self) -> &str {
        match self {
            TierOutcome::Distributed { resolution, .. }
            | TierOutcome::Failed { resolution, .. } => resolution,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TierOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub video_id: String,
    pub tiers: Vec<TierOutcome>,
}

impl RunSummary {
    pub fn failed_tiers(&self) -> Vec<&str> {
        self.tiers
            .iter()
            .filter(|t| t.is_failed())
            .map(TierOutcome::resolution)
            .collect()
    }
}

/// Progress after `attempted` of `total` tiers: 10 + attempted * 80 / total.
pub fn tier_progress(attempted: usize, total: usize) -> u8 {
    if total == 0 {
        return DOWNLOADED_PROGRESS;
    }
    let attempted = attempted.min(total);
    DOWNLOADED_PROGRESS + (attempted * TRANSCODE_PROGRESS_SPAN / total) as u8
}

/// Drives one uploaded video through every configured tier.
///
/// Only a failed source download ends a run as `failed`. Tier and segment
/// failures are absorbed, and the run still finishes `completed`.
pub struct Pipeline {
    storage: Arc<dyn StoragePort>,
    transcoder: RenditionTranscoder,
    distributor: SegmentDistributor,
    status: StatusTracker,
    metrics: Arc<dyn MetricsSink>,
    tiers: Arc<[QualityTier]>,
    work_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        transcoder: RenditionTranscoder,
        distributor: SegmentDistributor,
        status: StatusTracker,
        metrics: Arc<dyn MetricsSink>,
        tiers: Vec<QualityTier>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            storage,
            transcoder,
            distributor,
            status,
            metrics,
            tiers: tiers.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Wire a pipeline from configuration and the adapters chosen by the caller.
    pub fn from_config(
        config: &PipelineConfig,
        storage: Arc<dyn StoragePort>,
        metadata: Arc<dyn MetadataStore>,
        publisher: Arc<dyn StatusPublisher>,
        executor: Arc<dyn TranscodeExecutor>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, PlacementError> {
        let selector = Arc::new(config.node_selector()?);
        let status =
            StatusTracker::new(metadata.clone(), publisher).with_deadline(config.metadata_timeout);
        let distributor = SegmentDistributor::new(
            storage.clone(),
            metadata,
            selector,
            metrics.clone(),
            config.metadata_timeout,
        );
        let transcoder = RenditionTranscoder::new(executor, config.transcode_settings());

        Ok(Self::new(
            storage,
            transcoder,
            distributor,
            status,
            metrics,
            config.quality_tiers.clone(),
            config.work_dir.clone(),
        ))
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    /// Local directory owned by one video's run.
    pub fn video_dir(&self, video_id: &str) -> PathBuf {
        self.work_dir.join(video_id)
    }

    pub async fn process(&self, event: &UploadEvent) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        let video_id = event.video_id.as_str();
        tracing::info!(
            video_id,
            user_id = %event.user_id,
            key = %event.s3_key,
            "starting video processing"
        );

        self.status
            .update(video_id, ProcessingState::Processing, 0, "starting video processing")
            .await;

        let video_dir = self.video_dir(video_id);
        let source = match self.fetch_source(event, &video_dir).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(video_id, error = %e, "aborting run");
                self.status
                    .update(video_id, ProcessingState::Failed, 0, e.to_string())
                    .await;
                self.metrics
                    .increment(VIDEO_PROCESSING_TOTAL, &[("status", "failed")]);
                self.cleanup(&video_dir).await;
                return Err(e);
            }
        };

        self.status
            .update(
                video_id,
                ProcessingState::Processing,
                DOWNLOADED_PROGRESS,
                "video downloaded, starting transcoding",
            )
            .await;

        let total = self.tiers.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, tier) in self.tiers.iter().enumerate() {
            let outcome = self.run_tier(video_id, &source, &video_dir, tier).await;
            let message = match &outcome {
                TierOutcome::Distributed { resolution, .. } => format!("transcoded {}", resolution),
                TierOutcome::Failed { resolution, error } => {
                    format!("failed to transcode {}: {}", resolution, error)
                }
            };
            self.status
                .update(
                    video_id,
                    ProcessingState::Processing,
                    tier_progress(index + 1, total),
                    message,
                )
                .await;
            outcomes.push(outcome);
        }

        self.cleanup(&video_dir).await;

        let summary = RunSummary {
            video_id: video_id.to_string(),
            tiers: outcomes,
        };
        self.status
            .update(
                video_id,
                ProcessingState::Completed,
                100,
                completion_message(&summary),
            )
            .await;
        self.metrics
            .increment(VIDEO_PROCESSING_TOTAL, &[("status", "success")]);
        self.metrics.observe(
            VIDEO_PROCESSING_DURATION,
            &[("quality", "all")],
            start.elapsed().as_secs_f64(),
        );
        tracing::info!(
            video_id,
            elapsed = ?start.elapsed(),
            failed_tiers = summary.failed_tiers().len(),
            "video processing completed"
        );

        Ok(summary)
    }

    async fn fetch_source(
        &self,
        event: &UploadEvent,
        video_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        // Sources and renditions live in sibling directories, so no file name
        // can collide with a tier's output directory.
        let source_dir = video_dir.join(SOURCE_DIR);
        tokio::fs::create_dir_all(&source_dir)
            .await
            .map_err(|source| PipelineError::WorkDir {
                path: source_dir.clone(),
                source,
            })?;

        let local_path = source_dir.join(&event.file_name);
        self.storage
            .download(&event.s3_key, &local_path)
            .await
            .map_err(|source| PipelineError::Download {
                key: event.s3_key.clone(),
                source,
            })?;
        Ok(local_path)
    }

    async fn run_tier(
        &self,
        video_id: &str,
        source: &Path,
        video_dir: &Path,
        tier: &QualityTier,
    ) -> TierOutcome {
        let start = Instant::now();
        let output_dir = video_dir.join(RENDITIONS_DIR).join(&tier.resolution);

        let rendition = match self.transcoder.transcode(source, &output_dir, tier).await {
            Ok(rendition) => rendition,
            Err(e) => {
                tracing::error!(
                    video_id,
                    tier = %tier.resolution,
                    error = %e,
                    output = e.output().unwrap_or_default(),
                    "transcoding failed"
                );
                self.metrics.increment(FFMPEG_FAILURES, &[]);
                return TierOutcome::Failed {
                    resolution: tier.resolution.clone(),
                    error: e.to_string(),
                };
            }
        };

        let report = self
            .distributor
            .distribute_rendition(video_id, &rendition)
            .await;
        self.metrics.observe(
            VIDEO_PROCESSING_DURATION,
            &[("quality", tier.resolution.as_str())],
            start.elapsed().as_secs_f64(),
        );

        TierOutcome::Distributed {
            resolution: tier.resolution.clone(),
            segments: report.segments.len(),
            skipped: report.skipped.len(),
            playlist_uploaded: report.playlist_uploaded,
        }
    }

    async fn cleanup(&self, video_dir: &Path) {
        match tokio::fs::remove_dir_all(video_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    dir = %video_dir.display(),
                    error = %e,
                    "failed to remove working directory"
                );
            }
        }
    }
}

fn completion_message(summary: &RunSummary) -> String {
    let failed = summary.failed_tiers();
    if failed.is_empty() {
        "video processing completed".to_string()
    } else {
        format!(
            "video processing completed; {} of {} tiers failed ({})",
            failed.len(),
            summary.tiers.len(),
            failed.join(", ")
        )
    }
}
