use crate::domain::video::{ProcessingStatus, UploadEvent};
use crate::ports::events::{StatusPublisher, UploadEventSource};
use crate::ports::PortError;
use async_trait::async_trait;
use aws_sdk_sqs::types::MessageAttributeValue;
use aws_sdk_sqs::Client;

/// Longest long-poll SQS accepts.
const MAX_WAIT_SECS: f64 = 20.0;

/// Reads upload events from an SQS queue.
#[derive(Clone)]
pub struct SqsEventSource {
    client: Client,
    queue_url: String,
}

impl SqsEventSource {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl UploadEventSource for SqsEventSource {
    async fn next_event(&self, timeout_secs: f64) -> Result<Option<UploadEvent>, PortError> {
        let wait_time = timeout_secs.clamp(0.0, MAX_WAIT_SECS).ceil() as i32;
        let resp = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(wait_time)
            .send()
            .await?;

        let Some(msg) = resp.messages.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        // The message is deleted before the event reaches the dispatcher, and
        // an undecodable body is deleted too so it cannot block the queue.
        let event = msg
            .body()
            .ok_or_else(|| PortError::from("upload event message has no body"))
            .and_then(|body| serde_json::from_str::<UploadEvent>(body).map_err(PortError::from));
        if let Some(receipt_handle) = msg.receipt_handle() {
            self.client
                .delete_message()
                .queue_url(&self.queue_url)
                .receipt_handle(receipt_handle)
                .send()
                .await?;
        }
        event.map(Some)
    }
}

/// Publishes status snapshots to an SQS queue, keyed by video id.
#[derive(Clone)]
pub struct SqsStatusPublisher {
    client: Client,
    queue_url: String,
}

impl SqsStatusPublisher {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl StatusPublisher for SqsStatusPublisher {
    async fn publish_status(&self, status: &ProcessingStatus) -> Result<(), PortError> {
        let message_body = serde_json::to_string(status)?;
        let video_id = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(&status.video_id)
            .build()?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .message_attributes("video_id", video_id)
            .send()
            .await?;
        Ok(())
    }
}
