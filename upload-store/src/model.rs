use std::collections::BTreeMap;

use serde::Serialize;

/// A signed request the client can replay without AWS credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedRequest {
    pub url: String,
    /// Headers that were signed and must be sent unchanged.
    pub headers: BTreeMap<String, String>,
}

/// Response of `POST /presign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadCredential {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub key: String,
}

/// Row written to the upload registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    pub username: String,
    pub uploaded_at: i64,
    pub s3_key: String,
    pub filename: String,
    pub size: u64,
}

/// Response of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUpload {
    pub ok: bool,
    pub download_url: String,
    pub s3_key: String,
}
