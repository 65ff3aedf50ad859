//! Storage seams for the upload flow.
//!
//! [`ObjectStore`] signs URLs for the bucket and [`UploadRegistry`] persists
//! upload records. The AWS implementations live in [`aws`].

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    errors::Result,
    model::{PresignedRequest, UploadRecord},
};

pub mod aws;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Signed `PUT` for `key`, restricted to `content_type`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedRequest>;

    /// Signed `GET` URL for `key`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String>;
}

#[async_trait]
pub trait UploadRegistry: Send + Sync {
    async fn put(&self, record: &UploadRecord) -> Result<()>;
}
