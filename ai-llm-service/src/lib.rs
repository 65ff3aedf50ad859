//! AI query orchestrator for the finance-advisory chat.
//!
//! - [`model_pool`]: one Gemini model handle per process, primary → fallback
//! - [`prompt_builder`]: bounded, deterministic prompt text
//! - [`inference_executor`]: blocking provider call on a bounded worker pool, under a deadline
//! - [`response_extractor`]: closed-shape parsing of the raw response
//! - [`orchestrator`]: the `ask` flow and its error taxonomy
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{
//!     AiSettings, ModelHandlePool, Orchestrator,
//!     services::gemini_service::GeminiModelFactory,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = AiSettings::from_env()?;
//! let factory = Arc::new(GeminiModelFactory::from_settings(&settings));
//! let pool = Arc::new(ModelHandlePool::from_settings(&settings, factory).await?);
//! let orchestrator = Orchestrator::new(pool.clone(), &settings);
//!
//! let answer = orchestrator.ask("What is an index fund?", None).await?;
//! println!("{}", answer.text);
//!
//! pool.teardown().await;
//! # Ok(()) }
//! ```

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod inference_executor;
pub mod model_pool;
pub mod orchestrator;
pub mod prompt_builder;
pub mod response_extractor;
pub mod services;
pub mod telemetry;

pub use config::{
    ai_settings::AiSettings, generation_params::GenerationParams, model_role::ModelRole,
};
pub use error_handler::{AiLlmError, ConfigError, ProviderError};
pub use model_pool::{ModelHandle, ModelHandlePool, PoolStatus};
pub use orchestrator::{AnswerOutcome, AskAnswer, AskError, Orchestrator};
