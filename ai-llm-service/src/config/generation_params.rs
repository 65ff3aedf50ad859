use serde::Serialize;

/// Fixed generation parameters sent with every inference call.
///
/// These are process-wide configuration, never per-request overrides.
///
/// Serialized as Gemini's `generationConfig` object:
///
/// ```
/// use ai_llm_service::config::generation_params::GenerationParams;
///
/// let params = GenerationParams { temperature: 0.2, max_output_tokens: 1024 };
/// let json = serde_json::to_value(&params).unwrap();
/// assert_eq!(json["maxOutputTokens"], 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Sampling temperature (0.0 = deterministic).
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 1024,
        }
    }
}
