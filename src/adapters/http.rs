//! HTTP inbound adapter: upload submission, status queries, health and metrics.

use super::metrics::InMemoryMetrics;
use crate::application::ingest::{Dispatcher, SubmitError};
use crate::application::status::StatusTracker;
use crate::domain::video::{ProcessingStatus, UploadEvent};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub status: StatusTracker,
    pub metrics: Arc<InMemoryMetrics>,
}

#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub message: &'static str,
    pub video_id: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/videos/upload", post(upload_video))
        .route("/api/videos/:video_id/status", get(video_status))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn upload_video(
    State(state): State<AppState>,
    Json(event): Json<UploadEvent>,
) -> Result<(StatusCode, Json<UploadAccepted>), (StatusCode, String)> {
    let video_id = event.video_id.clone();
    match state.dispatcher.submit(event).await {
        Ok(()) => {
            tracing::info!(video_id = %video_id, "upload accepted");
            Ok((
                StatusCode::ACCEPTED,
                Json(UploadAccepted {
                    message: "Video processing started",
                    video_id,
                }),
            ))
        }
        Err(e @ SubmitError::Invalid(_)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e @ SubmitError::Closed) => Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}

async fn video_status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<ProcessingStatus>, (StatusCode, String)> {
    match state.status.current(&video_id).await {
        Ok(Some(status)) => Ok(Json(status)),
        Ok(None) => Ok(Json(ProcessingStatus::unknown(video_id))),
        Err(e) => {
            tracing::error!(video_id = %video_id, error = %e, "status lookup failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn ready() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
