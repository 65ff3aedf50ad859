use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request payload for /ai/ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    pub query: String,
    /// Opaque portfolio context, passed to the model as pretty JSON.
    #[serde(default)]
    pub portfolio: Option<Value>,
}

/// Response payload for /ai/ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response_text: String,
}
