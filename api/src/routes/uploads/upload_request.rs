use serde::Deserialize;
use serde_json::Value;

/// Request payload for /presign.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub filename: String,
    pub content_type: String,
    pub username: String,
}

/// Request payload for /register.
///
/// Every field is optional at the wire level; absent required fields are
/// reported as "missing fields" by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub s3_key: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Number or numeric string; defaults to 0.
    #[serde(default)]
    pub size: Option<Value>,
}

impl RegisterRequest {
    /// `None` when `size` is present but not a non-negative integer.
    pub fn size(&self) -> Option<u64> {
        match &self.size {
            None | Some(Value::Null) => Some(0),
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        }
    }
}
