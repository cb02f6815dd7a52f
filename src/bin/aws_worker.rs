//! AWS Worker Binary
//!
//! Long-running worker that:
//! 1. Connects to AWS services (S3, SQS, DynamoDB).
//! 2. Drains upload events from SQS through the ingest loop.
//! 3. Serves the status API, health and metrics.
//!
//! Environment Variables:
//! - AWS_REGION: AWS region (e.g., us-east-1)
//! - S3_BUCKET: S3 bucket for sources and renditions
//! - UPLOAD_QUEUE_URL: SQS queue URL carrying upload events
//! - STATUS_QUEUE_URL: SQS queue URL receiving status events
//! - DYNAMODB_TABLE: DynamoDB table used as the metadata store

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vodpipe::adapters::aws::{DynamoAdapter, S3Adapter, SqsEventSource, SqsStatusPublisher};
use vodpipe::adapters::http::{self, AppState};
use vodpipe::adapters::metrics::InMemoryMetrics;
use vodpipe::application::ingest::{self, pump_events, Ingestor};
use vodpipe::config::AwsConfig;
use vodpipe::domain::av::SystemExecutor;
use vodpipe::{telemetry, Pipeline};

#[tokio::main]
async fn main() {
    telemetry::init();

    let config = match AwsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Load AWS config
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    // Create adapters
    let storage = Arc::new(S3Adapter::new(
        aws_sdk_s3::Client::new(&sdk_config),
        config.s3_bucket.clone(),
    ));
    let sqs_client = aws_sdk_sqs::Client::new(&sdk_config);
    let events = Arc::new(SqsEventSource::new(
        sqs_client.clone(),
        config.upload_queue_url.clone(),
    ));
    let publisher = Arc::new(SqsStatusPublisher::new(
        sqs_client,
        config.status_queue_url.clone(),
    ));
    let metadata = Arc::new(DynamoAdapter::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config.dynamodb_table.clone(),
    ));
    let metrics = Arc::new(InMemoryMetrics::new());

    let pipeline = match Pipeline::from_config(
        &config.pipeline,
        storage,
        metadata,
        publisher,
        Arc::new(SystemExecutor),
        metrics.clone(),
    ) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            tracing::error!(error = %e, "failed to build pipeline");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let (dispatcher, rx) = ingest::channel(
        config.pipeline.ingest_queue_capacity,
        pipeline.status().clone(),
    );
    let ingestor = tokio::spawn(
        Ingestor::new(pipeline.clone(), config.pipeline.max_concurrent_jobs)
            .run(rx, shutdown.clone()),
    );
    let pump = tokio::spawn(pump_events(events, dispatcher.clone(), shutdown.clone()));

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
        bucket = %config.s3_bucket,
        queue = %config.upload_queue_url,
        "AWS worker started, polling for upload events"
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
    tracing::info!("AWS worker stopped");
}
