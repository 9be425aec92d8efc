//! DynamoDB-backed [`FileStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{FileRow, FileStore};
use crate::types::FileId;
use crate::{MuninnError, Result};

/// Default table name.
pub const DEFAULT_TABLE: &str = "LatestFiles";

/// [`FileStore`] over a DynamoDB table.
///
/// One row per (bucket, channel): partition key `Bucket`, sort key
/// `Channel`, plus `ObjectKey` and `Pattern` string attributes. `Bucket`
/// is a DynamoDB reserved word, so projection expressions alias it.
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Connect using the ambient AWS environment (shared config files,
    /// environment variables, instance metadata), optionally overriding
    /// the region.
    pub async fn from_env(table: impl Into<String>, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), table)
    }
}

#[async_trait]
impl FileStore for DynamoStore {
    async fn scan_ids(&self) -> Result<Vec<FileId>> {
        let mut ids = Vec::new();
        let mut items = self
            .client
            .scan()
            .table_name(&self.table)
            .projection_expression("#bkt, Channel")
            .expression_attribute_names("#bkt", "Bucket")
            .into_paginator()
            .items()
            .send();
        while let Some(item) = items.next().await {
            let item = item.map_err(|e| MuninnError::Store(DisplayErrorContext(e).to_string()))?;
            ids.push(FileId {
                bucket: string_attr(&item, "Bucket")?,
                channel: string_attr(&item, "Channel")?,
            });
        }
        Ok(ids)
    }

    async fn fetch(&self, id: &FileId) -> Result<Option<FileRow>> {
        let out = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("Bucket", AttributeValue::S(id.bucket.clone()))
            .key("Channel", AttributeValue::S(id.channel.clone()))
            .send()
            .await
            .map_err(|e| MuninnError::Store(DisplayErrorContext(e).to_string()))?;

        let Some(item) = out.item else {
            return Ok(None);
        };
        Ok(Some(FileRow {
            object_key: string_attr(&item, "ObjectKey")?,
            pattern: string_attr(&item, "Pattern")?,
        }))
    }
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| MuninnError::Decode(format!("missing or non-string attribute `{name}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_attr_decodes_string_values() {
        let mut item = HashMap::new();
        item.insert("Bucket".to_string(), AttributeValue::S("b".to_string()));
        assert_eq!(string_attr(&item, "Bucket").unwrap(), "b");
    }

    #[test]
    fn string_attr_rejects_missing_and_non_string() {
        let mut item = HashMap::new();
        item.insert("N".to_string(), AttributeValue::N("7".to_string()));
        assert!(matches!(
            string_attr(&item, "Bucket"),
            Err(MuninnError::Decode(_))
        ));
        assert!(matches!(string_attr(&item, "N"), Err(MuninnError::Decode(_))));
    }
}
