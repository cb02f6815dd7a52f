use crate::ports::metadata::MetadataStore;
use crate::ports::PortError;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

const KEY_ATTRIBUTE: &str = "key";
const VALUE_ATTRIBUTE: &str = "value";

/// DynamoAdapter implements MetadataStore on a table whose partition key is
/// the string attribute `key`.
#[derive(Clone)]
pub struct DynamoAdapter {
    client: Client,
    table_name: String,
}

impl DynamoAdapter {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl MetadataStore for DynamoAdapter {
    async fn put(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .item(VALUE_ATTRIBUTE, AttributeValue::S(value.to_string()))
            .send()
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        let resp = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await?;

        Ok(resp
            .item
            .and_then(|item| item.get(VALUE_ATTRIBUTE).cloned())
            .and_then(|v| v.as_s().ok().cloned()))
    }
}
