//! Process-wide holder of the single active model handle.
//!
//! The pool is constructed once at startup with [`ModelHandlePool::init`],
//! shared through application state, and emptied at shutdown with
//! [`ModelHandlePool::teardown`]. Between those two points the handle is
//! read-only; request handlers only ever clone the `Arc`.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::task;
use tracing::{info, instrument, warn};

use crate::{
    config::{ai_settings::AiSettings, generation_params::GenerationParams, model_role::ModelRole},
    error_handler::{AiLlmError, ConfigError, ProviderError},
    services::{GenerativeModel, ModelFactory},
};

/// A configured binding to one remote model variant.
pub struct ModelHandle {
    role: ModelRole,
    initialized_at: DateTime<Utc>,
    model: Arc<dyn GenerativeModel>,
}

impl ModelHandle {
    pub fn new(role: ModelRole, model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            role,
            initialized_at: Utc::now(),
            model,
        }
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn role(&self) -> ModelRole {
        self.role
    }

    pub fn initialized_at(&self) -> DateTime<Utc> {
        self.initialized_at
    }

    /// Blocking call into the provider. Run it on a blocking worker.
    pub fn generate_content(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Value, ProviderError> {
        self.model.generate_content(prompt, params)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model_id", &self.model_id())
            .field("role", &self.role)
            .field("initialized_at", &self.initialized_at)
            .finish()
    }
}

/// Serializable snapshot of the pool, used by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ModelRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialized_at: Option<DateTime<Utc>>,
}

/// Holds at most one [`ModelHandle`].
#[derive(Debug, Default)]
pub struct ModelHandlePool {
    slot: RwLock<Option<Arc<ModelHandle>>>,
}

impl ModelHandlePool {
    /// A pool with no handle; `get()` returns `None`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A pool wrapping an already-built handle.
    pub fn with_handle(handle: ModelHandle) -> Self {
        Self {
            slot: RwLock::new(Some(Arc::new(handle))),
        }
    }

    /// Convenience wrapper over [`ModelHandlePool::init`] using the configured ids.
    pub async fn from_settings(
        settings: &AiSettings,
        factory: Arc<dyn ModelFactory>,
    ) -> Result<Self, AiLlmError> {
        Self::init(
            &settings.primary_model,
            &settings.fallback_model,
            &settings.api_key,
            factory,
        )
        .await
    }

    /// Builds the pool, trying `primary_model_id` first and `fallback_model_id`
    /// if the primary cannot be constructed.
    ///
    /// Construction runs on the blocking pool because it may perform network I/O.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] if `api_key` is blank (no connect attempt is made)
    /// - [`AiLlmError::ModelInit`] if neither model could be constructed
    #[instrument(skip(api_key, factory))]
    pub async fn init(
        primary_model_id: &str,
        fallback_model_id: &str,
        api_key: &str,
        factory: Arc<dyn ModelFactory>,
    ) -> Result<Self, AiLlmError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar("GEMINI_API_KEY").into());
        }

        let primary = primary_model_id.to_string();
        let fallback = fallback_model_id.to_string();
        let key = api_key.to_string();

        let handle = task::spawn_blocking(move || {
            connect_with_fallback(factory.as_ref(), &primary, &fallback, &key)
        })
        .await
        .map_err(|e| AiLlmError::Worker(e.to_string()))??;

        info!(
            model = %handle.model_id(),
            role = %handle.role(),
            "model handle ready"
        );
        Ok(Self::with_handle(handle))
    }

    /// Current handle, or `None` before init / after teardown.
    pub fn get(&self) -> Option<Arc<ModelHandle>> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn status(&self) -> PoolStatus {
        match self.get() {
            Some(handle) => PoolStatus {
                initialized: true,
                model: Some(handle.model_id().to_string()),
                role: Some(handle.role()),
                initialized_at: Some(handle.initialized_at()),
            },
            None => PoolStatus {
                initialized: false,
                model: None,
                role: None,
                initialized_at: None,
            },
        }
    }

    /// Releases the handle. Subsequent `get()` calls return `None`.
    ///
    /// Requests already holding a clone keep it until they finish.
    pub async fn teardown(&self) {
        let taken = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(handle) = taken {
            let model = handle.model_id().to_string();
            // Blocking HTTP clients must not be dropped on an async worker.
            let _ = task::spawn_blocking(move || drop(handle)).await;
            info!(%model, "model handle released");
        }
    }
}

/// Blocking: tries the primary model, then the fallback.
fn connect_with_fallback(
    factory: &dyn ModelFactory,
    primary: &str,
    fallback: &str,
    api_key: &str,
) -> Result<ModelHandle, AiLlmError> {
    let primary_err = match factory.connect(primary, api_key) {
        Ok(model) => return Ok(ModelHandle::new(ModelRole::Primary, model)),
        Err(err) => err,
    };

    warn!(
        primary = %primary,
        fallback = %fallback,
        error = %primary_err,
        "failed to init primary model, falling back"
    );

    match factory.connect(fallback, api_key) {
        Ok(model) => Ok(ModelHandle::new(ModelRole::Fallback, model)),
        Err(fallback_err) => Err(AiLlmError::ModelInit {
            primary: primary.to_string(),
            primary_cause: primary_err.to_string(),
            fallback: fallback.to_string(),
            fallback_cause: fallback_err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;

    use super::*;

    struct EchoModel(String);

    impl GenerativeModel for EchoModel {
        fn model_id(&self) -> &str {
            &self.0
        }

        fn generate_content(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<Value, ProviderError> {
            Ok(json!({ "text": prompt }))
        }
    }

    /// Fails for every id listed in `broken`, records every attempt.
    #[derive(Default)]
    struct ScriptedFactory {
        broken: Vec<&'static str>,
        attempts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ModelFactory for ScriptedFactory {
        fn connect(
            &self,
            model_id: &str,
            _api_key: &str,
        ) -> Result<Arc<dyn GenerativeModel>, AiLlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.attempts.lock().unwrap().push(model_id.to_string());
            if self.broken.contains(&model_id) {
                Err(ProviderError::Decode(format!("{model_id} unavailable")).into())
            } else {
                Ok(Arc::new(EchoModel(model_id.to_string())))
            }
        }
    }

    #[tokio::test]
    async fn primary_is_used_when_it_works() {
        let factory = Arc::new(ScriptedFactory::default());
        let pool = ModelHandlePool::init("primary", "fallback", "key", factory.clone())
            .await
            .unwrap();

        let handle = pool.get().expect("handle");
        assert_eq!(handle.model_id(), "primary");
        assert_eq!(handle.role(), ModelRole::Primary);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn falls_back_when_primary_fails() {
        let factory = Arc::new(ScriptedFactory {
            broken: vec!["primary"],
            ..Default::default()
        });
        let pool = ModelHandlePool::init("primary", "fallback", "key", factory.clone())
            .await
            .unwrap();

        let handle = pool.get().expect("handle");
        assert_eq!(handle.model_id(), "fallback");
        assert_eq!(handle.role(), ModelRole::Fallback);
        assert_eq!(
            *factory.attempts.lock().unwrap(),
            vec!["primary".to_string(), "fallback".to_string()]
        );
    }

    #[tokio::test]
    async fn fails_when_both_models_fail() {
        let factory = Arc::new(ScriptedFactory {
            broken: vec!["primary", "fallback"],
            ..Default::default()
        });
        let err = ModelHandlePool::init("primary", "fallback", "key", factory)
            .await
            .unwrap_err();

        match err {
            AiLlmError::ModelInit {
                primary, fallback, ..
            } => {
                assert_eq!(primary, "primary");
                assert_eq!(fallback, "fallback");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn blank_key_fails_without_connecting() {
        let factory = Arc::new(ScriptedFactory::default());
        let err = ModelHandlePool::init("primary", "fallback", "  ", factory.clone())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("GEMINI_API_KEY"))
        ));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn teardown_empties_the_pool() {
        let pool = ModelHandlePool::with_handle(ModelHandle::new(
            ModelRole::Primary,
            Arc::new(EchoModel("m".into())),
        ));
        assert!(pool.status().initialized);

        pool.teardown().await;

        assert!(pool.get().is_none());
        assert!(!pool.status().initialized);
        // Second teardown is a no-op.
        pool.teardown().await;
    }

    #[test]
    fn empty_pool_has_no_handle() {
        let pool = ModelHandlePool::empty();
        assert!(pool.get().is_none());
        let status = serde_json::to_value(pool.status()).unwrap();
        assert_eq!(status, json!({ "initialized": false }));
    }
}
