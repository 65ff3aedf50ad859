//! AI settings loaded from environment variables.
//!
//! One [`AiSettings`] value is built at startup and shared by every part of
//! the ask flow, so there is exactly one source of model ids, limits and
//! timeouts for the whole process.
//!
//! # Environment variables
//!
//! - `GEMINI_API_KEY`        = API credential (mandatory)
//! - `GEMINI_PRIMARY_MODEL`  = preferred model (default `models/gemini-2.5-flash`)
//! - `GEMINI_FALLBACK_MODEL` = fallback model (default `models/gemini-2.5-pro-latest`)
//! - `GEMINI_API_BASE`       = API base URL (default `https://generativelanguage.googleapis.com`)
//! - `GEMINI_API_VERSION`    = API version segment (default `v1beta`)
//! - `GEMINI_VERIFY_ON_INIT` = probe the model during init (default `true`)
//! - `AI_TIMEOUT_SECONDS`    = per-request deadline (default `30`)
//! - `AI_MAX_PROMPT_CHARS`   = query character budget (default `2000`)
//! - `MAX_OUTPUT_TOKENS`     = generation cap (default `1024`)
//! - `AI_TEMPERATURE`        = sampling temperature, `0.0..=2.0` (default `0.2`)
//! - `AI_WORKER_POOL_SIZE`   = max in-flight inference calls (default `8`)

use std::{fmt, time::Duration};

use crate::{
    config::generation_params::GenerationParams,
    error_handler::{
        ConfigError, Result, env_opt, env_opt_bool, env_opt_f32, env_opt_u32, env_opt_u64,
        must_env, validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_PRIMARY_MODEL: &str = "models/gemini-2.5-flash";
pub const DEFAULT_FALLBACK_MODEL: &str = "models/gemini-2.5-pro-latest";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 2000;
pub const DEFAULT_WORKER_POOL_SIZE: usize = 8;

/// Static, process-lifetime configuration of the AI query flow.
#[derive(Clone)]
pub struct AiSettings {
    pub api_key: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub api_base: String,
    pub api_version: String,
    /// When set, model construction issues a metadata probe so a bad model
    /// id fails at startup instead of on the first request.
    pub verify_on_init: bool,
    pub timeout: Duration,
    pub max_prompt_chars: usize,
    pub generation: GenerationParams,
    pub worker_pool_size: usize,
}

impl AiSettings {
    /// Settings with defaults for everything except the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            verify_on_init: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            generation: GenerationParams::default(),
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
        }
    }

    /// Loads settings strictly from environment variables.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] if `GEMINI_API_KEY` is missing
    /// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad limits
    /// - [`ConfigError::InvalidFormat`] if `GEMINI_API_BASE` is not http(s)
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::new(must_env("GEMINI_API_KEY")?);

        if let Some(model) = env_opt("GEMINI_PRIMARY_MODEL") {
            cfg.primary_model = model.trim().to_string();
        }
        if let Some(model) = env_opt("GEMINI_FALLBACK_MODEL") {
            cfg.fallback_model = model.trim().to_string();
        }
        if let Some(base) = env_opt("GEMINI_API_BASE") {
            validate_http_endpoint("GEMINI_API_BASE", base.trim())?;
            cfg.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(version) = env_opt("GEMINI_API_VERSION") {
            cfg.api_version = version.trim().trim_matches('/').to_string();
        }
        if let Some(verify) = env_opt_bool("GEMINI_VERIFY_ON_INIT")? {
            cfg.verify_on_init = verify;
        }
        if let Some(secs) = env_opt_u64("AI_TIMEOUT_SECONDS")? {
            if secs == 0 {
                return Err(ConfigError::OutOfRange {
                    field: "AI_TIMEOUT_SECONDS",
                    detail: "expected at least 1 second",
                }
                .into());
            }
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(chars) = env_opt_u32("AI_MAX_PROMPT_CHARS")? {
            cfg.max_prompt_chars = positive("AI_MAX_PROMPT_CHARS", chars)?;
        }
        if let Some(tokens) = env_opt_u32("MAX_OUTPUT_TOKENS")? {
            cfg.generation.max_output_tokens = positive("MAX_OUTPUT_TOKENS", tokens)? as u32;
        }
        if let Some(temperature) = env_opt_f32("AI_TEMPERATURE")? {
            validate_range_f32("AI_TEMPERATURE", temperature, 0.0, 2.0)?;
            cfg.generation.temperature = temperature;
        }
        if let Some(size) = env_opt_u32("AI_WORKER_POOL_SIZE")? {
            cfg.worker_pool_size = positive("AI_WORKER_POOL_SIZE", size)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks cross-field invariants that `from_env` cannot express per variable.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar("GEMINI_API_KEY").into());
        }
        if self.primary_model.trim().is_empty() || self.fallback_model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("GEMINI_API_BASE", &self.api_base)?;
        validate_range_f32("temperature", self.generation.temperature, 0.0, 2.0)?;
        Ok(())
    }

    pub fn with_models(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary_model = primary.into();
        self.fallback_model = fallback.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_prompt_chars(mut self, chars: usize) -> Self {
        self.max_prompt_chars = chars.max(1);
        self
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size.max(1);
        self
    }
}

impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSettings")
            .field("api_key", &"<redacted>")
            .field("primary_model", &self.primary_model)
            .field("fallback_model", &self.fallback_model)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("verify_on_init", &self.verify_on_init)
            .field("timeout", &self.timeout)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("generation", &self.generation)
            .field("worker_pool_size", &self.worker_pool_size)
            .finish()
    }
}

fn positive(field: &'static str, value: u32) -> Result<usize> {
    if value == 0 {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected a value greater than zero",
        }
        .into())
    } else {
        Ok(value as usize)
    }
}
