use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    backends::{
        ObjectStore, UploadRegistry,
        aws::{DynamoUploadRegistry, S3ObjectStore, load_sdk_config},
    },
    config::UploadSettings,
    errors::{Result, UploadError},
    model::{RegisteredUpload, UploadCredential, UploadRecord},
    object_key::new_object_key,
};

/// Issues upload credentials and records completed uploads.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    registry: Arc<dyn UploadRegistry>,
    url_ttl: Duration,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registry: Arc<dyn UploadRegistry>,
        url_ttl: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            url_ttl,
        }
    }

    /// S3 bucket plus DynamoDB table from `settings`.
    pub async fn from_settings(settings: &UploadSettings) -> Self {
        let sdk = load_sdk_config(settings).await;
        info!(
            region = %settings.region,
            bucket = %settings.bucket,
            table = %settings.table,
            "upload backends ready"
        );
        Self::new(
            Arc::new(S3ObjectStore::new(&sdk, &settings.bucket)),
            Arc::new(DynamoUploadRegistry::new(&sdk, &settings.table)),
            settings.url_ttl,
        )
    }

    /// Mints a fresh object key and a signed upload for it.
    ///
    /// # Errors
    /// - [`UploadError::MissingFields`] / [`UploadError::InvalidInput`] for bad input
    /// - [`UploadError::Presign`] when signing fails
    #[instrument(skip(self))]
    pub async fn issue_upload_credential(
        &self,
        username: &str,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadCredential> {
        let content_type = content_type.trim();
        if content_type.is_empty() {
            return Err(UploadError::MissingFields);
        }

        let key = new_object_key(username, filename)?;
        let signed = self
            .store
            .presign_put(&key, content_type, self.url_ttl)
            .await?;

        info!(%key, "upload credential issued");
        Ok(UploadCredential {
            url: signed.url,
            fields: signed.headers,
            key,
        })
    }

    /// Records an upload and returns a download URL for it.
    ///
    /// A failed registry write is logged and otherwise ignored.
    ///
    /// # Errors
    /// - [`UploadError::MissingFields`] for a blank username or key
    /// - [`UploadError::Presign`] when the download URL cannot be signed
    #[instrument(skip(self))]
    pub async fn register_upload(
        &self,
        username: &str,
        s3_key: &str,
        filename: &str,
        size: u64,
    ) -> Result<RegisteredUpload> {
        let (username, s3_key) = (username.trim(), s3_key.trim());
        if username.is_empty() || s3_key.is_empty() {
            return Err(UploadError::MissingFields);
        }

        let record = UploadRecord {
            username: username.to_string(),
            uploaded_at: Utc::now().timestamp(),
            s3_key: s3_key.to_string(),
            filename: filename.to_string(),
            size,
        };
        if let Err(err) = self.registry.put(&record).await {
            warn!(error = %err, key = %s3_key, "upload registry write failed, continuing");
        }

        let download_url = self.store.presign_get(s3_key, self.url_ttl).await?;

        Ok(RegisteredUpload {
            ok: true,
            download_url,
            s3_key: s3_key.to_string(),
        })
    }
}
