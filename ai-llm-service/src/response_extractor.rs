//! Reduction of a raw provider response to one answer string.
//!
//! The raw object is untrusted and its shape drifts between model variants,
//! so it goes through a single parsing boundary, [`ResponseShape::classify`],
//! which yields a closed set of variants. [`extract`] then works on those
//! variants exhaustively. Neither function panics; every surprise becomes a
//! [`ExtractionFailure`] or a degraded rendering of the raw object.
//!
//! Both Gemini REST (`promptFeedback.blockReason`, `finishReason`) and
//! snake_case spellings (`prompt_feedback.block_reason`) are accepted.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// A type mismatch found while inspecting the raw response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected response shape at `{path}`: expected {expected}, found {found}")]
pub struct ShapeError {
    pub path: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Why no answer text could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// The provider withheld content (policy/safety).
    #[error("content blocked by provider: {reason}")]
    ContentBlocked { reason: String },

    /// Candidates were returned but carried no text.
    #[error("provider returned no text (finish reason: {})", .finish_reason.as_deref().unwrap_or("n/a"))]
    EmptyGeneration { finish_reason: Option<String> },

    /// The response did not have the types we expect.
    #[error(transparent)]
    ParseError(#[from] ShapeError),
}

/// One generated alternative.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    /// Text of each part in order; `None` for parts without text.
    pub parts: Vec<Option<String>>,
    pub finish_reason: Option<String>,
}

impl Candidate {
    fn has_content(&self) -> bool {
        !self.parts.is_empty()
    }

    fn joined_text(&self) -> String {
        self.parts.iter().flatten().map(String::as_str).collect()
    }
}

/// The closed set of response shapes we know how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// A block indicator and no candidate content.
    Blocked { reason: String },
    /// A non-empty top-level `text` field.
    DirectText(String),
    /// At least one candidate.
    CandidateList(Vec<Candidate>),
    /// None of the above.
    Unrecognized,
}

impl ResponseShape {
    /// Classifies `raw`, preferring (in order) block, direct text, candidates.
    ///
    /// A field is only inspected when the earlier steps found nothing, so a
    /// malformed field that the answer does not need never hides the answer.
    ///
    /// # Errors
    /// [`ShapeError`] when no step matched and a known field has an
    /// unexpected JSON type.
    pub fn classify(raw: &Value) -> Result<Self, ShapeError> {
        let Value::Object(root) = raw else {
            return Ok(ResponseShape::Unrecognized);
        };

        let block_reason = parse_block_reason(root);
        if let Ok(Some(reason)) = &block_reason {
            let has_content = parse_candidates(root)
                .is_ok_and(|candidates| candidates.iter().any(Candidate::has_content));
            if !has_content {
                return Ok(ResponseShape::Blocked {
                    reason: reason.clone(),
                });
            }
        }

        let direct_text = opt_string(root, &["text"], "text");
        if let Ok(Some(text)) = &direct_text {
            if !text.is_empty() {
                return Ok(ResponseShape::DirectText(text.clone()));
            }
        }

        let candidates = parse_candidates(root)?;
        if !candidates.is_empty() {
            return Ok(ResponseShape::CandidateList(candidates));
        }

        block_reason?;
        direct_text?;
        Ok(ResponseShape::Unrecognized)
    }
}

/// Extracts the answer text from a raw provider response.
///
/// # Errors
/// - [`ExtractionFailure::ContentBlocked`] for a blocked prompt
/// - [`ExtractionFailure::EmptyGeneration`] when candidates carry no text
/// - [`ExtractionFailure::ParseError`] on unexpected field types
pub fn extract(raw: &Value) -> Result<String, ExtractionFailure> {
    match ResponseShape::classify(raw)? {
        ResponseShape::Blocked { reason } => Err(ExtractionFailure::ContentBlocked { reason }),
        ResponseShape::DirectText(text) => Ok(text),
        ResponseShape::CandidateList(candidates) => {
            match candidates.iter().find(|c| c.has_content()) {
                Some(candidate) => {
                    let text = candidate.joined_text();
                    if text.is_empty() {
                        Err(ExtractionFailure::EmptyGeneration {
                            finish_reason: candidate.finish_reason.clone(),
                        })
                    } else {
                        Ok(text)
                    }
                }
                None => Err(ExtractionFailure::EmptyGeneration {
                    finish_reason: candidates.first().and_then(|c| c.finish_reason.clone()),
                }),
            }
        }
        ResponseShape::Unrecognized => {
            let rendered = render(raw);
            if rendered.trim().is_empty() {
                return Err(ExtractionFailure::EmptyGeneration {
                    finish_reason: None,
                });
            }
            warn!(
                rendered_chars = rendered.chars().count(),
                "unrecognized response shape; returning raw rendering"
            );
            Ok(rendered)
        }
    }
}

fn render(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/* ------------------------------------------------------------------------- */
/* Field parsing                                                             */
/* ------------------------------------------------------------------------- */

fn parse_candidates(root: &Map<String, Value>) -> Result<Vec<Candidate>, ShapeError> {
    let Some(list) = field(root, &["candidates"]) else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = list else {
        return Err(mismatch("candidates", "array", list));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_candidate(i, item))
        .collect()
}

fn parse_candidate(index: usize, item: &Value) -> Result<Candidate, ShapeError> {
    let path = format!("candidates[{index}]");
    let Value::Object(obj) = item else {
        return Err(mismatch(&path, "object", item));
    };

    let finish_reason = match field(obj, &["finishReason", "finish_reason"]) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => None,
    };

    let parts = match field(obj, &["content"]) {
        None => Vec::new(),
        Some(Value::Object(content)) => parse_parts(&path, content)?,
        Some(other) => return Err(mismatch(&format!("{path}.content"), "object", other)),
    };

    Ok(Candidate {
        parts,
        finish_reason,
    })
}

fn parse_parts(
    candidate_path: &str,
    content: &Map<String, Value>,
) -> Result<Vec<Option<String>>, ShapeError> {
    let path = format!("{candidate_path}.content.parts");
    let Some(parts) = field(content, &["parts"]) else {
        return Ok(Vec::new());
    };
    let Value::Array(parts) = parts else {
        return Err(mismatch(&path, "array", parts));
    };

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| match part {
            Value::Object(obj) => opt_string(obj, &["text"], &format!("{path}[{i}].text")),
            other => Err(mismatch(&format!("{path}[{i}]"), "object", other)),
        })
        .collect()
}

fn parse_block_reason(root: &Map<String, Value>) -> Result<Option<String>, ShapeError> {
    let Some(feedback) = field(root, &["promptFeedback", "prompt_feedback"]) else {
        return Ok(None);
    };
    let Value::Object(feedback) = feedback else {
        return Err(mismatch("promptFeedback", "object", feedback));
    };

    let reason = match field(feedback, &["blockReason", "block_reason"]) {
        None => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => return Err(mismatch("promptFeedback.blockReason", "string", other)),
    };

    Ok(reason.filter(|r| !r.is_empty() && r != "BLOCK_REASON_UNSPECIFIED" && r != "0"))
}

/// First present, non-null value among `keys`.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn opt_string(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
) -> Result<Option<String>, ShapeError> {
    match field(obj, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(mismatch(path, "string", other)),
    }
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> ShapeError {
    ShapeError {
        path: path.to_string(),
        expected,
        found: type_name(found),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
