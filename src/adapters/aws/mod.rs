//! AWS adapters: S3 object store, SQS event queues, DynamoDB metadata.

pub mod dynamodb;
pub mod s3;
pub mod sqs;

pub use dynamodb::DynamoAdapter;
pub use s3::S3Adapter;
pub use sqs::{SqsEventSource, SqsStatusPublisher};
