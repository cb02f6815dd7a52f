//! Single entry point for upload events, with admission control.
//!
//! Both the durable-log consumer and the HTTP handler submit through a
//! [`Dispatcher`]. One [`Ingestor`] drains the channel, holding a semaphore
//! permit for the whole of each run.

use super::pipeline::Pipeline;
use super::status::StatusTracker;
use crate::domain::video::{InvalidEvent, ProcessingState, UploadEvent};
use crate::ports::events::UploadEventSource;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Long-poll window used when reading from the durable log.
pub const POLL_TIMEOUT_SECS: f64 = 5.0;
const SOURCE_ERROR_PAUSE: Duration = Duration::from_secs(1);
pub const ABANDONED_MESSAGE: &str = "abandoned at shutdown";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid upload event: {0}")]
    Invalid(#[from] InvalidEvent),
    #[error("ingest queue is closed")]
    Closed,
}

pub fn channel(
    capacity: usize,
    status: StatusTracker,
) -> (Dispatcher, mpsc::Receiver<UploadEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Dispatcher { tx, status }, rx)
}

#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<UploadEvent>,
    status: StatusTracker,
}

impl Dispatcher {
    /// Validate and queue an event. Waits while the queue is full.
    pub async fn submit(&self, event: UploadEvent) -> Result<(), SubmitError> {
        event.validate()?;
        // The slot is held before `pending` is written, so an accepted event
        // always reaches the ingest loop, even one that is shutting down.
        let slot = self.tx.reserve().await.map_err(|_| SubmitError::Closed)?;
        self.status
            .update(&event.video_id, ProcessingState::Pending, 0, "queued for processing")
            .await;
        slot.send(event);
        Ok(())
    }
}

pub struct Ingestor {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
}

impl Ingestor {
    pub fn new(pipeline: Arc<Pipeline>, max_concurrent_jobs: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    /// Run until `shutdown` fires or every dispatcher is dropped, then wait
    /// for in-flight runs.
    pub async fn run(self, mut rx: mpsc::Receiver<UploadEvent>, shutdown: CancellationToken) {
        let mut runs = JoinSet::new();

        loop {
            // A slot is taken before the next event, so a full pool stops
            // draining the channel and submitters wait.
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(joined) = runs.join_next(), if !runs.is_empty() => {
                    log_join(joined);
                    continue;
                }
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let pipeline = self.pipeline.clone();
            runs.spawn(async move {
                let _permit = permit;
                let video_id = event.video_id.clone();
                if let Err(e) = pipeline.process(&event).await {
                    tracing::error!(video_id = %video_id, error = %e, "video processing failed");
                }
                video_id
            });
        }

        // Events already accepted but never started get a terminal status.
        rx.close();
        while let Some(event) = rx.recv().await {
            tracing::warn!(video_id = %event.video_id, "abandoning queued event at shutdown");
            self.pipeline
                .status()
                .update(&event.video_id, ProcessingState::Failed, 0, ABANDONED_MESSAGE)
                .await;
        }

        if !runs.is_empty() {
            tracing::info!(in_flight = runs.len(), "waiting for in-flight runs");
        }
        while let Some(joined) = runs.join_next().await {
            log_join(joined);
        }
    }
}

fn log_join(joined: Result<String, tokio::task::JoinError>) {
    match joined {
        Ok(video_id) => tracing::debug!(video_id = %video_id, "run finished"),
        Err(e) => tracing::error!(error = %e, "run task panicked"),
    }
}

/// Forward events from the durable log into the dispatcher until shutdown.
pub async fn pump_events(
    source: Arc<dyn UploadEventSource>,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = source.next_event(POLL_TIMEOUT_SECS) => next,
        };

        match next {
            Ok(Some(event)) => {
                tracing::info!(video_id = %event.video_id, "received video upload event");
                match dispatcher.submit(event).await {
                    Ok(()) => {}
                    Err(SubmitError::Closed) => break,
                    Err(e) => tracing::warn!(error = %e, "dropping upload event"),
                }
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(error = %e, "error reading upload events");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(SOURCE_ERROR_PAUSE) => {}
                }
            }
        }
    }
}
