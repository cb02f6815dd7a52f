mod common;

use common::{FakeTranscoder, Harness, SEGMENTS_PER_TIER};
use std::collections::BTreeMap;
use vodpipe::application::PipelineError;
use vodpipe::domain::placement::{ChecksumSelector, NodeSelector};
use vodpipe::ports::metrics::{FFMPEG_FAILURES, SEGMENTS_CREATED, VIDEO_PROCESSING_TOTAL};
use vodpipe::{ProcessingState, ProcessingStatus, Segment};

fn segments(harness: &Harness) -> Vec<Segment> {
    harness
        .metadata
        .values_with_prefix("/segments/")
        .iter()
        .map(|json| serde_json::from_str(json).unwrap())
        .collect()
}

fn final_status(harness: &Harness, video_id: &str) -> ProcessingStatus {
    harness.publisher.published_for(video_id).pop().unwrap()
}

#[tokio::test]
async fn test_all_tiers_distributed() {
    let harness = Harness::new(FakeTranscoder::new());
    let event = harness.upload("video-a");

    let summary = harness.pipeline.process(&event).await.unwrap();
    assert!(summary.failed_tiers().is_empty());
    assert_eq!(summary.tiers.len(), 4);

    let records = segments(&harness);
    assert_eq!(records.len(), 4 * SEGMENTS_PER_TIER);

    let status = final_status(&harness, "video-a");
    assert_eq!(status.status, ProcessingState::Completed);
    assert_eq!(status.progress, 100);
    assert_eq!(status.message, "video processing completed");

    for tier in ["1080p", "720p", "480p", "360p"] {
        assert!(harness
            .storage
            .get(&format!("videos/video-a/{}/playlist.m3u8", tier))
            .is_some());
        assert_eq!(
            harness
                .metrics
                .counter(SEGMENTS_CREATED, &[("quality", tier)]),
            SEGMENTS_PER_TIER as u64
        );
    }
    assert_eq!(harness.metrics.counter(FFMPEG_FAILURES, &[]), 0);
    assert_eq!(
        harness
            .metrics
            .counter(VIDEO_PROCESSING_TOTAL, &[("status", "success")]),
        1
    );
    assert_eq!(
        harness.transcoder.bitrates(),
        vec!["5000k", "2500k", "1000k", "500k"]
    );
}

#[tokio::test]
async fn test_segment_records() {
    let harness = Harness::new(FakeTranscoder::new());
    let event = harness.upload("video-a");
    harness.pipeline.process(&event).await.unwrap();

    let selector = ChecksumSelector::new(harness.config.storage_nodes.clone()).unwrap();
    let mut by_tier: BTreeMap<String, Vec<Segment>> = BTreeMap::new();
    for segment in segments(&harness) {
        assert_eq!(segment.video_id, "video-a");
        assert_eq!(segment.node_id, selector.select(&segment.segment_id));
        assert_eq!(
            segment.s3_key,
            format!(
                "videos/video-a/{}/segment_{:03}.ts",
                segment.quality, segment.sequence
            )
        );
        assert!(harness.storage.get(&segment.s3_key).is_some());
        by_tier.entry(segment.quality.clone()).or_default().push(segment);
    }

    for (_, mut tier) in by_tier {
        tier.sort_by_key(|s| s.sequence);
        let sequences: Vec<usize> = tier.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, (0..SEGMENTS_PER_TIER).collect::<Vec<_>>());
        let durations: Vec<f64> = tier.iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![10.0, 10.0, 4.5]);
    }
}

#[tokio::test]
async fn test_download_failure_fails_the_run() {
    let harness = Harness::new(FakeTranscoder::new());
    let event = common::event("missing");

    let err = harness.pipeline.process(&event).await.unwrap_err();
    assert!(matches!(err, PipelineError::Download { .. }));

    let status = final_status(&harness, "missing");
    assert_eq!(status.status, ProcessingState::Failed);
    assert_eq!(status.progress, 0);
    assert!(status.message.starts_with("failed to download video"));

    assert!(segments(&harness).is_empty());
    assert_eq!(harness.transcoder.calls(), 0);
    assert_eq!(
        harness
            .metrics
            .counter(VIDEO_PROCESSING_TOTAL, &[("status", "failed")]),
        1
    );
    assert!(!harness.pipeline.video_dir("missing").exists());
}

#[tokio::test]
async fn test_one_tier_failure_still_completes() {
    let harness = Harness::new(FakeTranscoder::failing_at("2500k"));
    let event = harness.upload("video-c");

    let summary = harness.pipeline.process(&event).await.unwrap();
    assert_eq!(summary.failed_tiers(), vec!["720p"]);

    let records = segments(&harness);
    assert_eq!(records.len(), 3 * SEGMENTS_PER_TIER);
    assert!(records.iter().all(|s| s.quality != "720p"));
    assert!(harness
        .storage
        .get("videos/video-c/720p/playlist.m3u8")
        .is_none());

    let status = final_status(&harness, "video-c");
    assert_eq!(status.status, ProcessingState::Completed);
    assert_eq!(status.progress, 100);
    assert!(status.message.contains("720p"));

    assert_eq!(harness.metrics.counter(FFMPEG_FAILURES, &[]), 1);
    assert_eq!(harness.transcoder.calls(), 4);
}

#[tokio::test]
async fn test_status_sequence() {
    let harness = Harness::new(FakeTranscoder::failing_at("1000k"));
    let event = harness.upload("video-d");
    harness.pipeline.process(&event).await.unwrap();

    let history = harness.publisher.published_for("video-d");
    let progress: Vec<u8> = history.iter().map(|s| s.progress).collect();
    assert_eq!(progress, vec![0, 10, 30, 50, 70, 90, 100]);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let terminal: Vec<&ProcessingStatus> =
        history.iter().filter(|s| s.status.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].status, ProcessingState::Completed);
    assert_eq!(history.last().unwrap().status, ProcessingState::Completed);
    assert_eq!(
        history[4].message,
        "failed to transcode 480p: transcoder failed for 480p (exit code 1)"
    );

    let stored = harness.pipeline.status().current("video-d").await.unwrap().unwrap();
    assert_eq!(stored.status, ProcessingState::Completed);
}

#[tokio::test]
async fn test_working_directory_is_removed() {
    let harness = Harness::new(FakeTranscoder::new());
    let event = harness.upload("video-e");
    harness.pipeline.process(&event).await.unwrap();

    assert!(!harness.pipeline.video_dir("video-e").exists());
    assert!(harness.work_dir.path().exists());
}

#[tokio::test]
async fn test_segment_upload_failure_leaves_a_gap() {
    let harness = Harness::with_tiers(
        FakeTranscoder::new(),
        vec![vodpipe::QualityTier::new("720p", "2500k", "libx264")],
    );
    harness
        .storage
        .fail_upload("videos/video-f/720p/segment_001.ts");
    let event = harness.upload("video-f");

    harness.pipeline.process(&event).await.unwrap();

    let mut sequences: Vec<usize> = segments(&harness).iter().map(|s| s.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![0, 2]);
    assert_eq!(
        final_status(&harness, "video-f").status,
        ProcessingState::Completed
    );
}

#[tokio::test]
async fn test_source_named_like_a_tier() {
    let harness = Harness::new(FakeTranscoder::new());
    let mut event = harness.upload("video-g");
    event.file_name = "720p".to_string();

    let summary = harness.pipeline.process(&event).await.unwrap();

    assert!(summary.failed_tiers().is_empty());
    assert_eq!(segments(&harness).len(), 4 * SEGMENTS_PER_TIER);
}
