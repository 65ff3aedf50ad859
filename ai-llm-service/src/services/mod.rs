//! Model capabilities and their Gemini implementation.
//!
//! The ask flow only sees the two traits below: a [`ModelFactory`] turns a
//! model id into a connected [`GenerativeModel`], and the model performs one
//! **blocking** `generate_content` call. Tests plug in stubs here.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::generation_params::GenerationParams,
    error_handler::{AiLlmError, ProviderError},
};

pub mod gemini_service;

/// A connected binding to one remote model variant.
///
/// `generate_content` blocks the calling thread until the provider answers;
/// callers must run it off the async runtime (see `InferenceExecutor`).
pub trait GenerativeModel: Send + Sync {
    /// Provider-side identifier, e.g. `models/gemini-2.5-flash`.
    fn model_id(&self) -> &str;

    /// Sends one prompt and returns the raw, untrusted response object.
    fn generate_content(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Value, ProviderError>;
}

/// Builds [`GenerativeModel`]s. Construction may block (client setup, probe).
pub trait ModelFactory: Send + Sync {
    fn connect(&self, model_id: &str, api_key: &str)
    -> Result<Arc<dyn GenerativeModel>, AiLlmError>;
}
