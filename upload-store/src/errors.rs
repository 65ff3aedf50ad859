use thiserror::Error;

pub type Result<T> = std::result::Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    /// A required request field is absent or blank.
    #[error("missing fields")]
    MissingFields,

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("invalid value for {var}: {reason}")]
    Config { var: &'static str, reason: String },

    /// Signing an upload or download URL failed.
    #[error("couldn't make {what} url: {reason}")]
    Presign { what: &'static str, reason: String },

    /// Writing the upload record failed.
    #[error("registry write failed: {0}")]
    Registry(String),
}
