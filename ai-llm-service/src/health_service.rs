//! Live health probe for the configured Gemini model.
//!
//! `GET {base}/{version}/{model}` with the API key header. The returned
//! [`HealthStatus`] is JSON-serializable and suitable for a `/health`
//! endpoint. [`HealthService::check`] is resilient and never fails (errors
//! are mapped to `ok=false`); [`HealthService::try_probe`] returns a strict
//! `Result`.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ai_settings::AiSettings;
use crate::error_handler::{AiLlmError, HttpError, ProviderError, make_snippet};

/// A serializable health snapshot for one model.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: &'static str,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    /// Measured HTTP latency of the probe in milliseconds.
    pub latency_ms: u128,
    pub message: String,
}

/// Async health checker reusing a single HTTP client.
///
/// Kept separate from the blocking inference client so probes never compete
/// for inference workers.
pub struct HealthService {
    client: reqwest::Client,
    api_base: String,
    api_version: String,
}

impl HealthService {
    /// # Errors
    /// Returns [`ProviderError::Transport`] if the HTTP client cannot be built
    /// or [`ProviderError::Decode`] if the API key is not a valid header value.
    pub fn new(settings: &AiSettings, timeout: Duration) -> Result<Self, AiLlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(settings.api_key.trim())
                .map_err(|e| ProviderError::Decode(format!("invalid API key header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(ProviderError::from)?;

        info!(
            timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_version: settings.api_version.trim_matches('/').to_string(),
        })
    }

    /// Checks `model_id`. Never returns an error.
    pub async fn check(&self, model_id: &str) -> HealthStatus {
        let start = Instant::now();
        match self.try_probe(model_id).await {
            Ok(status) => {
                info!(
                    model = %status.model,
                    latency_ms = status.latency_ms as u64,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let latency_ms = start.elapsed().as_millis();
                warn!(
                    model = %model_id,
                    latency_ms = latency_ms as u64,
                    error = %err,
                    "health probe failed"
                );
                HealthStatus {
                    provider: "Gemini",
                    endpoint: self.api_base.clone(),
                    model: model_id.to_string(),
                    ok: false,
                    latency_ms,
                    message: err.to_string(),
                }
            }
        }
    }

    /// Strict probe. Returns an error on transport failures and non-2xx statuses.
    pub async fn try_probe(&self, model_id: &str) -> Result<HealthStatus, ProviderError> {
        let url = format!("{}/{}/{}", self.api_base, self.api_version, model_id);
        let start = Instant::now();
        debug!(model = %model_id, "GET {}", url);

        let resp = self.client.get(&url).send().await?;
        let latency_ms = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(ProviderError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            }));
        }

        #[derive(serde::Deserialize)]
        struct ModelInfo {
            #[serde(rename = "displayName")]
            display_name: Option<String>,
        }

        let message = match resp.json::<ModelInfo>().await {
            Ok(ModelInfo {
                display_name: Some(name),
            }) => format!("Gemini is healthy; serving {name}"),
            Ok(_) => "Gemini is healthy".to_string(),
            Err(e) => format!("Gemini is reachable; failed to decode model info: {e}"),
        };

        Ok(HealthStatus {
            provider: "Gemini",
            endpoint: self.api_base.clone(),
            model: model_id.to_string(),
            ok: true,
            latency_ms,
            message,
        })
    }
}
