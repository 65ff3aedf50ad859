//! Blocking Gemini client for text generation.
//!
//! Minimal, non-streaming client around the Generative Language REST API:
//! - `POST {base}/{version}/{model}:generateContent` : single generation
//! - `GET  {base}/{version}/{model}`                 : model metadata probe
//!
//! The client is **blocking** (`reqwest::blocking`). It must only be driven
//! from a blocking worker thread; the async side of the service reaches it
//! through `InferenceExecutor`.
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::{
    blocking::Client,
    header::{self, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
    config::{ai_settings::AiSettings, generation_params::GenerationParams},
    error_handler::{AiLlmError, ConfigError, HttpError, ProviderError, make_snippet},
    services::{GenerativeModel, ModelFactory},
};

/// Extra time the HTTP client allows beyond the caller's deadline.
///
/// A timed-out call keeps running on its worker; this caps how long it can
/// hold that worker.
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Harm categories sent with a `BLOCK_NONE` threshold.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

/// Builds [`GeminiModel`]s against one API base/version.
#[derive(Debug, Clone)]
pub struct GeminiModelFactory {
    api_base: String,
    api_version: String,
    request_timeout: Duration,
    verify_on_init: bool,
}

impl GeminiModelFactory {
    pub fn from_settings(settings: &AiSettings) -> Self {
        Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_version: settings.api_version.trim_matches('/').to_string(),
            request_timeout: settings.timeout + CLIENT_TIMEOUT_SLACK,
            verify_on_init: settings.verify_on_init,
        }
    }
}

impl ModelFactory for GeminiModelFactory {
    fn connect(
        &self,
        model_id: &str,
        api_key: &str,
    ) -> Result<Arc<dyn GenerativeModel>, AiLlmError> {
        let model = GeminiModel::new(
            &self.api_base,
            &self.api_version,
            model_id,
            api_key,
            self.request_timeout,
        )?;
        if self.verify_on_init {
            model.verify()?;
        }
        Ok(Arc::new(model))
    }
}

/// Thin blocking client bound to a single Gemini model.
#[derive(Debug)]
pub struct GeminiModel {
    client: Client,
    model_id: String,
    url_generate: String,
    url_model: String,
}

impl GeminiModel {
    /// Creates a client for `model_id`.
    ///
    /// Model ids are accepted with or without the `models/` prefix.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] if `model_id` is blank
    /// - [`ProviderError::InvalidEndpoint`] if `api_base` is not http(s)
    /// - [`ProviderError::Transport`] if the HTTP client cannot be built
    pub fn new(
        api_base: &str,
        api_version: &str,
        model_id: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, AiLlmError> {
        let model_path = normalize_model_id(model_id).ok_or(ConfigError::EmptyModel)?;

        let base = api_base.trim().trim_end_matches('/');
        if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProviderError::InvalidEndpoint(api_base.to_string()).into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|e| ProviderError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(ProviderError::from)?;

        let version = api_version.trim_matches('/');
        let url_model = format!("{base}/{version}/{model_path}");
        let url_generate = format!("{url_model}:generateContent");

        info!(
            model = %model_path,
            endpoint = %base,
            timeout_ms = timeout.as_millis() as u64,
            "GeminiModel initialized"
        );

        Ok(Self {
            client,
            model_id: model_path,
            url_generate,
            url_model,
        })
    }

    /// Confirms the model exists and the key is accepted.
    ///
    /// # Errors
    /// [`ProviderError::HttpStatus`] for non-2xx, [`ProviderError::Transport`]
    /// for network failures.
    #[instrument(skip_all, fields(model = %self.model_id))]
    pub fn verify(&self) -> Result<(), ProviderError> {
        let started = Instant::now();
        debug!("GET {}", self.url_model);

        let resp = self.client.get(&self.url_model).send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().unwrap_or_default());
            error!(
                %status,
                %snippet,
                latency_ms = started.elapsed().as_millis() as u64,
                "model probe returned non-success status"
            );
            return Err(ProviderError::HttpStatus(HttpError {
                status,
                url: self.url_model.clone(),
                snippet,
            }));
        }

        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            "model probe ok"
        );
        Ok(())
    }
}

impl GenerativeModel for GeminiModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    #[instrument(skip_all, fields(model = %self.model_id, prompt_chars = prompt.chars().count()))]
    fn generate_content(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Value, ProviderError> {
        let started = Instant::now();
        let body = GenerateContentRequest::new(prompt, params);

        debug!("POST {}", self.url_generate);
        let resp = self.client.post(&self.url_generate).json(&body).send()?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().unwrap_or_default());
            error!(
                %status,
                %snippet,
                latency_ms = started.elapsed().as_millis() as u64,
                "generateContent returned non-success status"
            );
            return Err(ProviderError::HttpStatus(HttpError {
                status,
                url: self.url_generate.clone(),
                snippet,
            }));
        }

        let raw: Value = resp.json().map_err(|e| {
            ProviderError::Decode(format!("generateContent body is not JSON: {e}"))
        })?;

        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            "generateContent completed"
        );
        Ok(raw)
    }
}

/// `gemini-2.5-flash` and `models/gemini-2.5-flash` address the same model.
fn normalize_model_id(model_id: &str) -> Option<String> {
    let id = model_id.trim().trim_matches('/');
    if id.is_empty() || id == "models" {
        return None;
    }
    if id.starts_with("models/") || id.starts_with("tunedModels/") {
        Some(id.to_string())
    } else {
        Some(format!("models/{id}"))
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: &'a GenerationParams,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, params: &'a GenerationParams) -> Self {
        Self {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: params,
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }
}
