use std::env;

use crate::{core::app_state::ConfigError, middleware_layer::cors::CorsPolicy};

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:8000",
    "http://localhost:8501",
    "http://127.0.0.1:8000",
    "http://localhost:3000",
];

/// Listener address and CORS allow-list.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub address: String,
    pub cors: CorsPolicy,
}

impl ServerSettings {
    /// Reads `API_ADDRESS` and `CORS_ALLOWED_ORIGINS` (comma-separated).
    pub fn from_env() -> Result<Self, ConfigError> {
        let address = env::var("API_ADDRESS")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string());
        if !address.contains(':') {
            return Err(ConfigError::Invalid {
                var: "API_ADDRESS",
                reason: format!("expected host:port, got `{address}`"),
            });
        }

        let cors = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) if !raw.trim().is_empty() => CorsPolicy::new(parse_origins(&raw))?,
            _ => CorsPolicy::new(DEFAULT_CORS_ORIGINS)?,
        };

        Ok(Self { address, cors })
    }
}

fn parse_origins(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect()
}
