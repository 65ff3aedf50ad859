use chrono::Utc;
use uuid::Uuid;

use crate::errors::{Result, UploadError};

/// `users/{username}/{unix_secs}_{uuid_hex}_{filename}`.
///
/// Only the last path component of `filename` is kept; `username` must be a
/// single path segment so one user cannot write under another's prefix.
pub fn new_object_key(username: &str, filename: &str) -> Result<String> {
    build_object_key(username, filename, Utc::now().timestamp(), Uuid::new_v4())
}

pub(crate) fn build_object_key(
    username: &str,
    filename: &str,
    unix_secs: i64,
    id: Uuid,
) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(UploadError::MissingFields);
    }
    if username.contains('/') || username == "." || username == ".." {
        return Err(UploadError::InvalidInput {
            field: "username",
            reason: "must not contain path separators".into(),
        });
    }

    let filename = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(UploadError::MissingFields)?;

    Ok(format!("users/{username}/{unix_secs}_{}_{filename}", id.simple()))
}
