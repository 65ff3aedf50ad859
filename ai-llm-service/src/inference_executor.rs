//! Deadline-bound execution of the blocking model call.
//!
//! - Concurrency via `tokio::Semaphore` + `spawn_blocking`: at most
//!   `pool_size` provider calls are in flight at once.
//! - The caller's wait (permit + call) is raced against a fixed deadline.
//!
//! # Cancellation
//!
//! Cancellation is cooperative only. When the deadline fires the caller gets
//! [`InferenceError::Timeout`], but the blocking call keeps running on its
//! worker thread until the provider answers or the HTTP client's own timeout
//! trips. Its permit is held until then, so abandoned calls still count
//! against `pool_size`. Nothing is aborted on the provider side.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::Value;
use thiserror::Error;
use tokio::{sync::Semaphore, task, time::timeout};
use tracing::{debug, instrument, warn};

use crate::{
    config::{ai_settings::AiSettings, generation_params::GenerationParams},
    error_handler::ProviderError,
    model_pool::ModelHandle,
    prompt_builder::Prompt,
};

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The deadline elapsed before a result arrived.
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    /// The provider call itself failed.
    #[error("provider call failed: {0}")]
    Provider(#[source] ProviderError),

    /// The worker panicked or the pool was shut down.
    #[error("inference worker failed: {0}")]
    Worker(String),
}

pub struct InferenceExecutor {
    permits: Arc<Semaphore>,
    pool_size: usize,
    deadline: Duration,
    params: GenerationParams,
}

impl InferenceExecutor {
    pub fn new(pool_size: usize, deadline: Duration, params: GenerationParams) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            deadline,
            params,
        }
    }

    pub fn from_settings(settings: &AiSettings) -> Self {
        Self::new(
            settings.worker_pool_size,
            settings.timeout,
            settings.generation,
        )
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Calls currently occupying a worker, including abandoned ones.
    pub fn in_flight(&self) -> usize {
        self.pool_size - self.permits.available_permits()
    }

    /// Runs one generation on the blocking pool and waits at most `deadline`.
    ///
    /// # Errors
    /// - [`InferenceError::Timeout`] if the deadline elapses first
    /// - [`InferenceError::Provider`] if the provider call fails
    /// - [`InferenceError::Worker`] if the worker panics
    #[instrument(
        name = "inference",
        skip_all,
        fields(model = %handle.model_id(), deadline_ms = self.deadline.as_millis() as u64)
    )]
    pub async fn execute(
        &self,
        handle: Arc<ModelHandle>,
        prompt: &Prompt,
    ) -> Result<Value, InferenceError> {
        let started = Instant::now();
        let text = prompt.as_str().to_owned();
        let params = self.params;
        let permits = Arc::clone(&self.permits);

        let call = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| InferenceError::Worker(e.to_string()))?;

            task::spawn_blocking(move || {
                let _permit = permit;
                handle.generate_content(&text, &params)
            })
            .await
            .map_err(|e| InferenceError::Worker(e.to_string()))?
            .map_err(InferenceError::Provider)
        };

        match timeout(self.deadline, call).await {
            Ok(result) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "inference finished"
                );
                result
            }
            Err(_) => {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    in_flight = self.in_flight(),
                    "inference deadline elapsed; provider call left running"
                );
                Err(InferenceError::Timeout(self.deadline))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::{
        config::model_role::ModelRole, prompt_builder::PromptBuilder, services::GenerativeModel,
    };

    /// Sleeps for `delay`, then echoes the prompt length.
    struct SlowModel {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl GenerativeModel for SlowModel {
        fn model_id(&self) -> &str {
            "slow"
        }

        fn generate_content(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<Value, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(json!({ "text": format!("len={}", prompt.len()) }))
        }
    }

    struct FailingModel;

    impl GenerativeModel for FailingModel {
        fn model_id(&self) -> &str {
            "failing"
        }

        fn generate_content(&self, _: &str, _: &GenerationParams) -> Result<Value, ProviderError> {
            Err(ProviderError::Decode("quota exceeded".into()))
        }
    }

    struct PanickingModel;

    impl GenerativeModel for PanickingModel {
        fn model_id(&self) -> &str {
            "panicking"
        }

        fn generate_content(&self, _: &str, _: &GenerationParams) -> Result<Value, ProviderError> {
            panic!("boom")
        }
    }

    fn handle(model: impl GenerativeModel + 'static) -> Arc<ModelHandle> {
        Arc::new(ModelHandle::new(ModelRole::Primary, Arc::new(model)))
    }

    fn prompt() -> Prompt {
        PromptBuilder::new(100).build("hello", None).unwrap()
    }

    #[tokio::test]
    async fn returns_raw_response_within_deadline() {
        let exec = InferenceExecutor::new(2, Duration::from_secs(2), GenerationParams::default());
        let model = handle(SlowModel {
            delay: Duration::from_millis(10),
            calls: AtomicUsize::new(0),
        });

        let raw = exec.execute(model, &prompt()).await.unwrap();
        assert!(raw["text"].as_str().unwrap().starts_with("len="));
        assert_eq!(exec.in_flight(), 0);
    }

    #[tokio::test]
    async fn deadline_is_enforced_with_small_margin() {
        let deadline = Duration::from_millis(100);
        let exec = InferenceExecutor::new(2, deadline, GenerationParams::default());
        let model = handle(SlowModel {
            delay: Duration::from_millis(800),
            calls: AtomicUsize::new(0),
        });

        let started = Instant::now();
        let err = exec.execute(model, &prompt()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, InferenceError::Timeout(d) if d == deadline));
        assert!(elapsed >= deadline, "returned early: {elapsed:?}");
        assert!(
            elapsed < deadline + Duration::from_millis(250),
            "returned late: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn abandoned_call_keeps_its_worker() {
        let exec = InferenceExecutor::new(1, Duration::from_millis(50), GenerationParams::default());
        let model = handle(SlowModel {
            delay: Duration::from_millis(400),
            calls: AtomicUsize::new(0),
        });

        let first = exec.execute(model.clone(), &prompt()).await;
        assert!(matches!(first, Err(InferenceError::Timeout(_))));
        assert_eq!(exec.in_flight(), 1);

        // The single worker is still busy, so this one cannot even start.
        let second = exec.execute(model, &prompt()).await;
        assert!(matches!(second, Err(InferenceError::Timeout(_))));
    }

    #[tokio::test]
    async fn provider_failure_is_classified() {
        let exec = InferenceExecutor::new(1, Duration::from_secs(1), GenerationParams::default());
        let err = exec.execute(handle(FailingModel), &prompt()).await.unwrap_err();
        assert!(matches!(err, InferenceError::Provider(ProviderError::Decode(_))));
    }

    #[tokio::test]
    async fn worker_panic_is_contained() {
        let exec = InferenceExecutor::new(1, Duration::from_secs(1), GenerationParams::default());
        let err = exec.execute(handle(PanickingModel), &prompt()).await.unwrap_err();
        assert!(matches!(err, InferenceError::Worker(_)));
        assert_eq!(exec.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pool_size_bounds_parallelism() {
        let exec = Arc::new(InferenceExecutor::new(
            1,
            Duration::from_secs(5),
            GenerationParams::default(),
        ));
        let model = handle(SlowModel {
            delay: Duration::from_millis(150),
            calls: AtomicUsize::new(0),
        });

        let started = Instant::now();
        let a = {
            let (exec, model) = (exec.clone(), model.clone());
            tokio::spawn(async move { exec.execute(model, &prompt()).await })
        };
        let b = {
            let (exec, model) = (exec.clone(), model.clone());
            tokio::spawn(async move { exec.execute(model, &prompt()).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
