use std::{sync::Arc, time::Duration};

use ai_llm_service::{
    AiLlmError, AiSettings, ModelHandlePool, Orchestrator, health_service::HealthService,
    services::gemini_service::GeminiModelFactory,
};
use market_quotes::{QuoteError, QuoteService, QuoteSettings};
use thiserror::Error;
use tracing::info;
use upload_store::{UploadError, UploadService, UploadSettings};

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Startup failures of any collaborator.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Ai(#[from] AiLlmError),

    #[error(transparent)]
    Quotes(#[from] QuoteError),

    #[error(transparent)]
    Uploads(#[from] UploadError),

    #[error("invalid CORS origin `{0}`")]
    CorsOrigin(String),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub quotes: Arc<QuoteService>,
    pub uploads: Arc<UploadService>,
    /// Live model probe for `/health?probe=true`; absent in tests.
    pub health: Option<Arc<HealthService>>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        quotes: Arc<QuoteService>,
        uploads: Arc<UploadService>,
        health: Option<Arc<HealthService>>,
    ) -> Self {
        Self {
            orchestrator,
            quotes,
            uploads,
            health,
        }
    }

    /// Builds every collaborator from environment variables.
    ///
    /// Fails when no Gemini model can be initialized.
    pub async fn from_env() -> Result<Self, ConfigError> {
        let ai = AiSettings::from_env()?;
        let factory = Arc::new(GeminiModelFactory::from_settings(&ai));
        let pool = Arc::new(ModelHandlePool::from_settings(&ai, factory).await?);
        let health = Arc::new(HealthService::new(&ai, HEALTH_PROBE_TIMEOUT)?);
        let orchestrator = Arc::new(Orchestrator::new(pool, &ai));

        let quotes = Arc::new(QuoteService::from_settings(&QuoteSettings::from_env()?)?);
        let uploads = Arc::new(UploadService::from_settings(&UploadSettings::from_env()?).await);

        info!(
            workers = orchestrator.executor().pool_size(),
            deadline_secs = orchestrator.executor().deadline().as_secs(),
            "application state ready"
        );

        Ok(Self::new(orchestrator, quotes, uploads, Some(health)))
    }
}
