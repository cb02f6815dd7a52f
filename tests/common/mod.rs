#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use vodpipe::adapters::memory::{MemoryMetadataStore, MemoryObjectStore, MemoryStatusPublisher};
use vodpipe::adapters::metrics::InMemoryMetrics;
use vodpipe::domain::av::{ProcessOutput, TranscodeExecutor};
use vodpipe::{Pipeline, PipelineConfig, QualityTier, UploadEvent};

pub const SEGMENTS_PER_TIER: usize = 3;

/// Stands in for ffmpeg: writes three segments and a playlist next to the
/// playlist path it is given, or fails when asked to encode at `fail_bitrate`.
#[derive(Default)]
pub struct FakeTranscoder {
    fail_bitrate: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
    bitrates: Mutex<Vec<String>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(bitrate: &str) -> Self {
        Self {
            fail_bitrate: Some(bitrate.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn bitrates(&self) -> Vec<String> {
        self.bitrates.lock().unwrap().clone()
    }
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[async_trait]
impl TranscodeExecutor for FakeTranscoder {
    async fn run(&self, _program: &str, args: &[String]) -> io::Result<ProcessOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        let bitrate = arg_after(args, "-b:v").unwrap_or_default().to_string();
        self.bitrates.lock().unwrap().push(bitrate.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = if self.fail_bitrate.as_deref() == Some(bitrate.as_str()) {
            Ok(ProcessOutput {
                success: false,
                code: Some(1),
                combined: "Conversion failed!".to_string(),
            })
        } else {
            let playlist = PathBuf::from(args.last().cloned().unwrap_or_default());
            write_rendition(&playlist).await.map(|()| ProcessOutput {
                success: true,
                code: Some(0),
                combined: String::new(),
            })
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

async fn write_rendition(playlist: &Path) -> io::Result<()> {
    let dir = playlist.parent().unwrap_or_else(|| Path::new("."));
    let mut body = String::from(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n",
    );
    for i in 0..SEGMENTS_PER_TIER {
        let name = format!("segment_{:03}.ts", i);
        tokio::fs::write(dir.join(&name), format!("segment {}", i)).await?;
        let duration = if i + 1 == SEGMENTS_PER_TIER { 4.5 } else { 10.0 };
        body.push_str(&format!("#EXTINF:{:.6},\n{}\n", duration, name));
    }
    body.push_str("#EXT-X-ENDLIST\n");
    tokio::fs::write(playlist, body).await
}

/// A pipeline wired to in-memory adapters and a temporary working directory.
pub struct Harness {
    pub pipeline: Arc<Pipeline>,
    pub storage: MemoryObjectStore,
    pub metadata: MemoryMetadataStore,
    pub publisher: MemoryStatusPublisher,
    pub metrics: Arc<InMemoryMetrics>,
    pub transcoder: Arc<FakeTranscoder>,
    pub config: PipelineConfig,
    pub work_dir: TempDir,
}

impl Harness {
    pub fn new(transcoder: FakeTranscoder) -> Self {
        Self::with_tiers(transcoder, QualityTier::default_ladder())
    }

    pub fn with_tiers(transcoder: FakeTranscoder, tiers: Vec<QualityTier>) -> Self {
        let work_dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            work_dir: work_dir.path().to_path_buf(),
            quality_tiers: tiers,
            max_concurrent_jobs: 2,
            ..PipelineConfig::default()
        };

        let storage = MemoryObjectStore::new();
        let metadata = MemoryMetadataStore::new();
        let publisher = MemoryStatusPublisher::new();
        let metrics = Arc::new(InMemoryMetrics::new());
        let transcoder = Arc::new(transcoder);

        let pipeline = Pipeline::from_config(
            &config,
            Arc::new(storage.clone()),
            Arc::new(metadata.clone()),
            Arc::new(publisher.clone()),
            transcoder.clone(),
            metrics.clone(),
        )
        .unwrap();

        Self {
            pipeline: Arc::new(pipeline),
            storage,
            metadata,
            publisher,
            metrics,
            transcoder,
            config,
            work_dir,
        }
    }

    /// Store a source object for `video_id` and return its upload event.
    pub fn upload(&self, video_id: &str) -> UploadEvent {
        let event = event(video_id);
        self.storage.insert(event.s3_key.clone(), b"source bytes".to_vec());
        event
    }
}

pub fn event(video_id: &str) -> UploadEvent {
    UploadEvent {
        video_id: video_id.to_string(),
        user_id: "user-1".to_string(),
        file_name: "source.mp4".to_string(),
        file_size: 12,
        s3_key: format!("uploads/user-1/{}/source.mp4", video_id),
        uploaded_at: Utc::now(),
    }
}
