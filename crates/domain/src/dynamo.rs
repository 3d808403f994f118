use std::collections::HashMap;

use aws_sdk_dynamodb::{
    error::DisplayErrorContext, operation::get_item::builders::GetItemFluentBuilder,
    types::AttributeValue,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::{Error, Service};

/// GSI keyed by `user_id`
pub const USER_INDEX: &str = "user_id-index";

/// GSI keyed by `patient_id`
pub const PATIENT_INDEX: &str = "patient_id-index";

/// One DynamoDB table holding rows keyed by `id`.
#[derive(Clone, Debug)]
pub struct Table {
    client: aws_sdk_dynamodb::Client,
    name: String,
}

impl Table {
    pub fn new(client: aws_sdk_dynamodb::Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub async fn put<T: Serialize>(&self, row: &T) -> Result<(), Error> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(row).map_err(codec_error)?;

        self.client
            .put_item()
            .table_name(&self.name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(())
    }

    /// Strongly consistent, so rows written earlier in the same request are
    /// always seen.
    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, Error> {
        let output = self.get_request(id).send().await.map_err(sdk_error)?;

        output
            .item
            .map(serde_dynamo::from_item)
            .transpose()
            .map_err(codec_error)
    }

    fn get_request(&self, id: &str) -> GetItemFluentBuilder {
        self.client
            .get_item()
            .table_name(&self.name)
            .key("id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
    }

    /// Rows whose `key` attribute equals `value`, read through `index`.
    // TODO: follow LastEvaluatedKey once a single key holds more than one 1 MB page.
    pub async fn query<T: DeserializeOwned>(
        &self,
        index: &str,
        key: &str,
        value: &str,
    ) -> Result<Vec<T>, Error> {
        let output = self
            .client
            .query()
            .table_name(&self.name)
            .index_name(index)
            .key_condition_expression("#key = :value")
            .expression_attribute_names("#key", key)
            .expression_attribute_values(":value", AttributeValue::S(value.to_string()))
            .send()
            .await
            .map_err(sdk_error)?;

        serde_dynamo::from_items(output.items.unwrap_or_default()).map_err(codec_error)
    }
}

fn sdk_error<E: std::error::Error>(err: E) -> Error {
    Error::dependency(Service::Database, DisplayErrorContext(err).to_string())
}

fn codec_error(err: serde_dynamo::Error) -> Error {
    Error::dependency(Service::Database, format!("Malformed row: {}", err))
}
