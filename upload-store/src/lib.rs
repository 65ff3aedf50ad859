//! Upload credentials for user documents.
//!
//! - `issue_upload_credential`: presigned S3 `PUT` for a fresh
//!   `users/{username}/...` key, valid for `UPLOAD_URL_TTL_SECS`.
//! - `register_upload`: records the upload in DynamoDB (best effort) and
//!   returns a presigned `GET` URL.

pub mod backends;
pub mod config;
pub mod errors;
pub mod model;
pub mod object_key;
pub mod service;

pub use config::UploadSettings;
pub use errors::UploadError;
pub use model::{PresignedRequest, RegisteredUpload, UploadCredential, UploadRecord};
pub use service::UploadService;
