use super::status::put_with_deadline;
use crate::domain::av::{ProducedSegment, Rendition};
use crate::domain::keys::{playlist_object_key, segment_key, segment_object_key};
use crate::domain::placement::NodeSelector;
use crate::domain::video::Segment;
use crate::ports::metadata::MetadataStore;
use crate::ports::metrics::{MetricsSink, SEGMENTS_CREATED, STORAGE_UPLOAD_DURATION};
use crate::ports::storage::StoragePort;
use crate::ports::PortError;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("upload to {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: PortError,
    },
    #[error("failed to encode segment {segment_id}: {source}")]
    Encode {
        segment_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to record segment {segment_id}: {source}")]
    Record {
        segment_id: String,
        #[source]
        source: PortError,
    },
}

/// Outcome of distributing one tier.
#[derive(Debug, Default)]
pub struct DistributionReport {
    /// Segments uploaded and recorded, in sequence order.
    pub segments: Vec<Segment>,
    /// Sequence numbers that were skipped.
    pub skipped: Vec<usize>,
    pub playlist_uploaded: bool,
}

pub struct SegmentDistributor {
    storage: Arc<dyn StoragePort>,
    metadata: Arc<dyn MetadataStore>,
    selector: Arc<dyn NodeSelector>,
    metrics: Arc<dyn MetricsSink>,
    deadline: Duration,
}

impl SegmentDistributor {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        metadata: Arc<dyn MetadataStore>,
        selector: Arc<dyn NodeSelector>,
        metrics: Arc<dyn MetricsSink>,
        deadline: Duration,
    ) -> Self {
        Self {
            storage,
            metadata,
            selector,
            metrics,
            deadline,
        }
    }

    /// Place, upload and record one segment file.
    pub async fn distribute_segment(
        &self,
        video_id: &str,
        resolution: &str,
        sequence: usize,
        produced: &ProducedSegment,
    ) -> Result<Segment, DistributionError> {
        let segment_id = Uuid::new_v4().to_string();
        let key = segment_object_key(video_id, resolution, sequence);
        let node_id = self.selector.select(&segment_id).to_string();

        self.upload(&produced.path, &key)
            .await
            .map_err(|source| DistributionError::Upload {
                key: key.clone(),
                source,
            })?;

        let segment = Segment {
            segment_id,
            video_id: video_id.to_string(),
            quality: resolution.to_string(),
            sequence,
            duration: produced.duration,
            s3_key: key,
            node_id,
        };

        let json = serde_json::to_string(&segment).map_err(|source| DistributionError::Encode {
            segment_id: segment.segment_id.clone(),
            source,
        })?;
        put_with_deadline(
            self.metadata.as_ref(),
            &segment_key(&segment.segment_id),
            &json,
            self.deadline,
        )
        .await
        .map_err(|source| DistributionError::Record {
            segment_id: segment.segment_id.clone(),
            source,
        })?;

        self.metrics
            .increment(SEGMENTS_CREATED, &[("quality", resolution)]);
        Ok(segment)
    }

    /// Distribute every segment of a rendition in sequence order, then its
    /// playlist. A failed segment is logged and skipped; nothing is retried.
    pub async fn distribute_rendition(
        &self,
        video_id: &str,
        rendition: &Rendition,
    ) -> DistributionReport {
        let mut report = DistributionReport::default();

        for (sequence, produced) in rendition.segments.iter().enumerate() {
            match self
                .distribute_segment(video_id, &rendition.resolution, sequence, produced)
                .await
            {
                Ok(segment) => {
                    tracing::debug!(
                        video_id,
                        tier = %rendition.resolution,
                        sequence,
                        node = %segment.node_id,
                        "segment distributed"
                    );
                    report.segments.push(segment);
                }
                Err(e) => {
                    tracing::warn!(
                        video_id,
                        tier = %rendition.resolution,
                        sequence,
                        file = %produced.path.display(),
                        error = %e,
                        "skipping segment"
                    );
                    report.skipped.push(sequence);
                }
            }
        }

        let playlist_key = playlist_object_key(video_id, &rendition.resolution);
        match self.upload(&rendition.playlist, &playlist_key).await {
            Ok(()) => report.playlist_uploaded = true,
            Err(e) => {
                tracing::warn!(video_id, key = %playlist_key, error = %e, "playlist upload failed");
            }
        }

        report
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), PortError> {
        let start = Instant::now();
        let result = self.storage.upload(local_path, key).await;
        self.metrics
            .observe(STORAGE_UPLOAD_DURATION, &[], start.elapsed().as_secs_f64());
        result
    }
}
