//! End-to-end `ask` flow.
//!
//! `Received → Validating → Building → Invoking → Extracting → {Succeeded | Failed}`
//!
//! One attempt per request, no retries. Only [`AskError`] values are failures
//! at the boundary; blocked, empty or unreadable provider output is absorbed
//! into a successful [`AskAnswer`] carrying an explanatory message, so the
//! answer text is never empty.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::ai_settings::AiSettings,
    inference_executor::{InferenceError, InferenceExecutor},
    model_pool::ModelHandlePool,
    prompt_builder::{PromptBuilder, PromptError},
    response_extractor::{ExtractionFailure, extract},
};

pub const EMPTY_GENERATION_MESSAGE: &str =
    "The AI model returned an empty response. Please try again.";
pub const PARSE_ERROR_MESSAGE: &str =
    "Could not read the AI response. The format was unexpected.";

fn blocked_message(reason: &str) -> String {
    format!(
        "Your query was blocked by the safety filter: {reason}. Please rephrase your question."
    )
}

/// How the answer text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// Genuine model output (possibly a degraded rendering of an unknown shape).
    Generated,
    /// The provider withheld content; text explains why.
    Blocked,
    /// No usable content; text is a diagnostic placeholder.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskAnswer {
    pub text: String,
    pub outcome: AnswerOutcome,
}

/// Failures visible to callers of [`Orchestrator::ask`].
#[derive(Debug, Error)]
pub enum AskError {
    #[error("query must not be empty")]
    InvalidInput,

    #[error("AI model is not initialized")]
    NotInitialized,

    #[error("AI service timed out after {0:?}")]
    Timeout(Duration),

    /// Display stays generic; the cause is available through `source()`.
    #[error("AI service error")]
    ProviderError(#[source] InferenceError),
}

impl AskError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AskError::InvalidInput => "INVALID_INPUT",
            AskError::NotInitialized => "MODEL_NOT_INITIALIZED",
            AskError::Timeout(_) => "AI_TIMEOUT",
            AskError::ProviderError(_) => "AI_PROVIDER_ERROR",
        }
    }

    /// Whether the same request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AskError::Timeout(_))
    }
}

#[derive(Debug, Clone, Copy)]
enum AskStage {
    Received,
    Validating,
    Building,
    Invoking,
    Extracting,
}

/// Composes prompt building, inference and extraction over one model pool.
pub struct Orchestrator {
    pool: Arc<ModelHandlePool>,
    builder: PromptBuilder,
    executor: InferenceExecutor,
}

impl Orchestrator {
    pub fn new(pool: Arc<ModelHandlePool>, settings: &AiSettings) -> Self {
        Self::with_parts(
            pool,
            PromptBuilder::new(settings.max_prompt_chars),
            InferenceExecutor::from_settings(settings),
        )
    }

    pub fn with_parts(
        pool: Arc<ModelHandlePool>,
        builder: PromptBuilder,
        executor: InferenceExecutor,
    ) -> Self {
        Self {
            pool,
            builder,
            executor,
        }
    }

    pub fn pool(&self) -> &Arc<ModelHandlePool> {
        &self.pool
    }

    pub fn executor(&self) -> &InferenceExecutor {
        &self.executor
    }

    /// Answers `query`, using `portfolio` as opaque context.
    ///
    /// # Errors
    /// - [`AskError::InvalidInput`] for an empty/whitespace query (no model call)
    /// - [`AskError::NotInitialized`] when the pool holds no handle
    /// - [`AskError::Timeout`] when the inference deadline elapses
    /// - [`AskError::ProviderError`] when the provider call fails
    #[instrument(
        name = "ask",
        skip_all,
        fields(query_chars = query.chars().count(), has_portfolio = portfolio.is_some())
    )]
    pub async fn ask(&self, query: &str, portfolio: Option<&Value>) -> Result<AskAnswer, AskError> {
        stage(AskStage::Received);

        stage(AskStage::Validating);
        if query.trim().is_empty() {
            debug!("rejecting empty query");
            return Err(AskError::InvalidInput);
        }
        let handle = self.pool.get().ok_or_else(|| {
            error!("ask called without an initialized model handle");
            AskError::NotInitialized
        })?;

        stage(AskStage::Building);
        let prompt = self
            .builder
            .build(query, portfolio)
            .map_err(|_: PromptError| AskError::InvalidInput)?;

        stage(AskStage::Invoking);
        let model = handle.model_id().to_string();
        let raw = self
            .executor
            .execute(handle, &prompt)
            .await
            .map_err(|err| match err {
                InferenceError::Timeout(deadline) => {
                    warn!(%model, ?deadline, "AI request timed out");
                    AskError::Timeout(deadline)
                }
                other => {
                    if credentials_rejected(&other) {
                        error!(%model, error = %other, "AI provider rejected the API key");
                    } else {
                        error!(%model, error = %other, "AI provider call failed");
                    }
                    AskError::ProviderError(other)
                }
            })?;

        stage(AskStage::Extracting);
        let answer = match extract(&raw) {
            Ok(text) => AskAnswer {
                text,
                outcome: AnswerOutcome::Generated,
            },
            Err(ExtractionFailure::ContentBlocked { reason }) => {
                warn!(%model, %reason, "prompt blocked by provider");
                AskAnswer {
                    text: blocked_message(&reason),
                    outcome: AnswerOutcome::Blocked,
                }
            }
            Err(ExtractionFailure::EmptyGeneration { finish_reason }) => {
                warn!(
                    %model,
                    finish_reason = finish_reason.as_deref().unwrap_or("n/a"),
                    "provider returned no text"
                );
                AskAnswer {
                    text: EMPTY_GENERATION_MESSAGE.to_string(),
                    outcome: AnswerOutcome::Degraded,
                }
            }
            Err(ExtractionFailure::ParseError(err)) => {
                warn!(%model, error = %err, "could not parse provider response");
                AskAnswer {
                    text: PARSE_ERROR_MESSAGE.to_string(),
                    outcome: AnswerOutcome::Degraded,
                }
            }
        };

        info!(
            %model,
            outcome = ?answer.outcome,
            prompt_truncated = prompt.truncated(),
            answer_chars = answer.text.chars().count(),
            "ask succeeded"
        );
        Ok(answer)
    }
}

fn credentials_rejected(err: &InferenceError) -> bool {
    matches!(err, InferenceError::Provider(provider) if provider.is_auth())
}

fn stage(stage: AskStage) {
    debug!(?stage, "ask stage");
}
