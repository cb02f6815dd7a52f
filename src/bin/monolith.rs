//! Monolith Binary - Local deployment
//!
//! This is the main entry point for local development and single-server deployment.
//! It wires up:
//! - Local adapters (filesystem object store, Redis lists and keyspace)
//! - The ingest loop draining upload events from Redis and HTTP
//! - The HTTP API with health and metrics

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vodpipe::adapters::http::{self, AppState};
use vodpipe::adapters::local::{FsAdapter, RedisPool};
use vodpipe::adapters::metrics::InMemoryMetrics;
use vodpipe::application::ingest::{self, pump_events, Ingestor};
use vodpipe::config::LocalConfig;
use vodpipe::domain::av::SystemExecutor;
use vodpipe::{telemetry, Pipeline};

#[tokio::main]
async fn main() {
    telemetry::init();

    let config = match LocalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // 1. Adapters (Local implementations)
    let redis = match RedisPool::new(
        &config.redis_url,
        config.upload_events_key.clone(),
        config.status_events_key.clone(),
    ) {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to Redis");
            std::process::exit(1);
        }
    };
    let storage = Arc::new(FsAdapter::new(&config.storage_dir));
    let metrics = Arc::new(InMemoryMetrics::new());

    // 2. Pipeline
    let pipeline = match Pipeline::from_config(
        &config.pipeline,
        storage,
        redis.clone(),
        redis.clone(),
        Arc::new(SystemExecutor),
        metrics.clone(),
    ) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            tracing::error!(error = %e, "failed to build pipeline");
            std::process::exit(1);
        }
    };

    // 3. Ingest loop, fed by the Redis upload list and the HTTP API
    let shutdown = CancellationToken::new();
    let (dispatcher, rx) = ingest::channel(
        config.pipeline.ingest_queue_capacity,
        pipeline.status().clone(),
    );
    let ingestor = tokio::spawn(
        Ingestor::new(pipeline.clone(), config.pipeline.max_concurrent_jobs)
            .run(rx, shutdown.clone()),
    );
    let pump = tokio::spawn(pump_events(redis, dispatcher.clone(), shutdown.clone()));

    // 4. HTTP Layer
    let app = http::router(AppState {
        dispatcher,
        status: pipeline.status().clone(),
        metrics,
    });

    let bind_addr = format!("{}:{}", config.addr, config.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(
        addr = %config.addr,
        port = %config.port,
        max_concurrent_jobs = config.pipeline.max_concurrent_jobs,
        "video processing service listening"
    );

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        signal.cancel();
    });

    let server_shutdown = shutdown.clone();
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await
    {
        tracing::error!(error = %e, "server error");
        shutdown.cancel();
    }

    let _ = pump.await;
    let _ = ingestor.await;
    tracing::info!("video processing service stopped");
}
