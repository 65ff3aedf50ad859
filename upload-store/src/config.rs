use std::{env, time::Duration};

use crate::errors::{Result, UploadError};

pub const DEFAULT_REGION: &str = "ap-south-1";
pub const DEFAULT_BUCKET: &str = "vittcott-uploads";
pub const DEFAULT_TABLE: &str = "user_files";
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub region: String,
    pub bucket: String,
    pub table: String,
    /// Validity of both upload and download URLs.
    pub url_ttl: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.into(),
            bucket: DEFAULT_BUCKET.into(),
            table: DEFAULT_TABLE.into(),
            url_ttl: DEFAULT_URL_TTL,
        }
    }
}

impl UploadSettings {
    /// Reads `AWS_REGION`, `S3_BUCKET`, `DDB_TABLE` and `UPLOAD_URL_TTL_SECS`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let url_ttl = match env_opt("UPLOAD_URL_TTL_SECS") {
            None => defaults.url_ttl,
            Some(raw) => parse_ttl(&raw)?,
        };
        Ok(Self {
            region: env_opt("AWS_REGION").unwrap_or(defaults.region),
            bucket: env_opt("S3_BUCKET").unwrap_or(defaults.bucket),
            table: env_opt("DDB_TABLE").unwrap_or(defaults.table),
            url_ttl,
        })
    }
}

fn env_opt(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// S3 presigned URLs are valid for at most seven days.
fn parse_ttl(raw: &str) -> Result<Duration> {
    const MAX_SECS: u64 = 7 * 24 * 3600;
    let secs: u64 = raw.parse().map_err(|e| UploadError::Config {
        var: "UPLOAD_URL_TTL_SECS",
        reason: format!("{e}"),
    })?;
    if secs == 0 || secs > MAX_SECS {
        return Err(UploadError::Config {
            var: "UPLOAD_URL_TTL_SECS",
            reason: format!("must be within 1..={MAX_SECS}, got {secs}"),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_bounds() {
        assert_eq!(parse_ttl("60").unwrap(), Duration::from_secs(60));
        assert!(parse_ttl("0").is_err());
        assert!(parse_ttl("604801").is_err());
        assert!(parse_ttl("soon").is_err());
    }
}
