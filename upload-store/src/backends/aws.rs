use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_s3::{error::DisplayErrorContext, presigning::PresigningConfig};
use tracing::{debug, instrument};

use crate::{
    backends::{ObjectStore, UploadRegistry},
    config::UploadSettings,
    errors::{Result, UploadError},
    model::{PresignedRequest, UploadRecord},
};

/// Shared AWS configuration for the configured region.
///
/// Credentials come from the default provider chain (env, profile, IMDS).
pub async fn load_sdk_config(settings: &UploadSettings) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .load()
        .await
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(sdk: &SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk),
            bucket: bucket.into(),
        }
    }
}

fn presigning(what: &'static str, ttl: Duration) -> Result<PresigningConfig> {
    PresigningConfig::expires_in(ttl).map_err(|e| UploadError::Presign {
        what,
        reason: e.to_string(),
    })
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedRequest> {
        let signed = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning("upload", ttl)?)
            .await
            .map_err(|e| UploadError::Presign {
                what: "upload",
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        let mut headers: BTreeMap<String, String> = signed
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        headers
            .entry("Content-Type".to_string())
            .or_insert_with(|| content_type.to_string());

        debug!(signed_headers = headers.len(), "upload url signed");
        Ok(PresignedRequest {
            url: signed.uri().to_string(),
            headers,
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String> {
        let signed = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning("download", ttl)?)
            .await
            .map_err(|e| UploadError::Presign {
                what: "download",
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(signed.uri().to_string())
    }
}

pub struct DynamoUploadRegistry {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl DynamoUploadRegistry {
    pub fn new(sdk: &SdkConfig, table: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_dynamodb::Client::new(sdk),
            table: table.into(),
        }
    }
}

#[async_trait]
impl UploadRegistry for DynamoUploadRegistry {
    #[instrument(skip(self, record), fields(table = %self.table, key = %record.s3_key))]
    async fn put(&self, record: &UploadRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .item("username", AttributeValue::S(record.username.clone()))
            .item("uploaded_at", AttributeValue::N(record.uploaded_at.to_string()))
            .item("s3_key", AttributeValue::S(record.s3_key.clone()))
            .item("filename", AttributeValue::S(record.filename.clone()))
            .item("size", AttributeValue::N(record.size.to_string()))
            .send()
            .await
            .map_err(|e| {
                UploadError::Registry(aws_sdk_dynamodb::error::DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}
