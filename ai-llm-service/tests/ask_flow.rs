use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use ai_llm_service::{
    AiLlmError, AnswerOutcome, AskError, GenerationParams, ModelHandle, ModelHandlePool,
    ModelRole, Orchestrator, ProviderError,
    error_handler::HttpError,
    inference_executor::InferenceExecutor,
    orchestrator::{EMPTY_GENERATION_MESSAGE, PARSE_ERROR_MESSAGE},
    prompt_builder::PromptBuilder,
    services::{GenerativeModel, ModelFactory},
};
use serde_json::{Value, json};

/// Replies with a fixed body after an optional delay and counts calls.
struct StubModel {
    id: String,
    delay: Duration,
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

#[derive(Clone)]
enum Reply {
    Raw(Value),
    /// Echoes the query segment of the prompt as candidate text.
    Echo,
    Unauthorized,
}

impl StubModel {
    fn new(reply: Reply) -> Self {
        Self {
            id: "models/stub".into(),
            delay: Duration::ZERO,
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl GenerativeModel for StubModel {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn generate_content(&self, prompt: &str, _: &GenerationParams) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        match &self.reply {
            Reply::Raw(v) => Ok(v.clone()),
            Reply::Echo => {
                let question = prompt
                    .split("User question:\n")
                    .nth(1)
                    .and_then(|rest| rest.split("\n\n").next())
                    .unwrap_or_default();
                Ok(json!({
                    "candidates": [{ "content": { "parts": [{ "text": format!("echo: {question}") }] } }]
                }))
            }
            Reply::Unauthorized => Err(ProviderError::HttpStatus(HttpError {
                status: reqwest::StatusCode::UNAUTHORIZED,
                url: "https://example.invalid".into(),
                snippet: "API key not valid".into(),
            })),
        }
    }
}

fn orchestrator_with(model: StubModel, pool_size: usize, deadline: Duration) -> Orchestrator {
    let handle = ModelHandle::new(ModelRole::Primary, Arc::new(model));
    Orchestrator::with_parts(
        Arc::new(ModelHandlePool::with_handle(handle)),
        PromptBuilder::new(2000),
        InferenceExecutor::new(pool_size, deadline, GenerationParams::default()),
    )
}

#[tokio::test]
async fn empty_query_is_rejected_without_calling_the_model() {
    let model = StubModel::new(Reply::Echo);
    let calls = model.calls.clone();
    let orch = orchestrator_with(model, 2, Duration::from_secs(5));

    for query in ["", "   ", "\n\t"] {
        let err = orch.ask(query, None).await.unwrap_err();
        assert!(matches!(err, AskError::InvalidInput));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_pool_reports_not_initialized() {
    let orch = Orchestrator::with_parts(
        Arc::new(ModelHandlePool::empty()),
        PromptBuilder::new(2000),
        InferenceExecutor::new(1, Duration::from_secs(1), GenerationParams::default()),
    );
    let err = orch.ask("hello", None).await.unwrap_err();
    assert!(matches!(err, AskError::NotInitialized));
}

#[tokio::test]
async fn direct_text_is_returned_verbatim() {
    let orch = orchestrator_with(
        StubModel::new(Reply::Raw(json!({ "text": "Buy low, sell high." }))),
        1,
        Duration::from_secs(5),
    );
    let answer = orch.ask("advice?", None).await.unwrap();
    assert_eq!(answer.text, "Buy low, sell high.");
    assert_eq!(answer.outcome, AnswerOutcome::Generated);
}

#[tokio::test]
async fn portfolio_context_reaches_the_model() {
    let orch = orchestrator_with(StubModel::new(Reply::Echo), 1, Duration::from_secs(5));
    let portfolio = json!({ "holdings": [{ "symbol": "INFY", "qty": 10 }] });
    let answer = orch.ask("Should I rebalance?", Some(&portfolio)).await.unwrap();
    assert_eq!(answer.text, "echo: Should I rebalance?");
}

#[tokio::test]
async fn slow_model_times_out() {
    let orch = orchestrator_with(
        StubModel::new(Reply::Echo).delayed(Duration::from_millis(300)),
        1,
        Duration::from_millis(50),
    );
    let err = orch.ask("hello", None).await.unwrap_err();
    assert!(matches!(err, AskError::Timeout(d) if d == Duration::from_millis(50)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn provider_failure_is_mapped_and_cause_kept() {
    let orch = orchestrator_with(StubModel::new(Reply::Unauthorized), 1, Duration::from_secs(5));
    let err = orch.ask("hello", None).await.unwrap_err();
    assert!(matches!(err, AskError::ProviderError(_)));
    assert_eq!(err.code(), "AI_PROVIDER_ERROR");

    let cause = std::error::Error::source(&err).map(ToString::to_string).unwrap();
    assert!(cause.contains("401"), "cause was: {cause}");
}

#[tokio::test]
async fn blocked_prompt_becomes_explanatory_answer() {
    let orch = orchestrator_with(
        StubModel::new(Reply::Raw(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))),
        1,
        Duration::from_secs(5),
    );
    let answer = orch.ask("something risky", None).await.unwrap();
    assert_eq!(answer.outcome, AnswerOutcome::Blocked);
    assert!(answer.text.contains("SAFETY"));
}

#[tokio::test]
async fn empty_and_malformed_responses_degrade_to_placeholders() {
    let empty = orchestrator_with(
        StubModel::new(Reply::Raw(json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
        }))),
        1,
        Duration::from_secs(5),
    );
    let answer = empty.ask("hello", None).await.unwrap();
    assert_eq!(answer.outcome, AnswerOutcome::Degraded);
    assert_eq!(answer.text, EMPTY_GENERATION_MESSAGE);

    let malformed = orchestrator_with(
        StubModel::new(Reply::Raw(json!({ "candidates": "not-a-list" }))),
        1,
        Duration::from_secs(5),
    );
    let answer = malformed.ask("hello", None).await.unwrap();
    assert_eq!(answer.outcome, AnswerOutcome::Degraded);
    assert_eq!(answer.text, PARSE_ERROR_MESSAGE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_asks_each_get_their_own_answer() {
    let delay = Duration::from_millis(200);
    let orch = Arc::new(orchestrator_with(
        StubModel::new(Reply::Echo).delayed(delay),
        8,
        Duration::from_secs(5),
    ));

    let started = Instant::now();
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let orch = orch.clone();
            tokio::spawn(async move { (i, orch.ask(&format!("question {i}"), None).await) })
        })
        .collect();

    for task in tasks {
        let (i, result) = task.await.unwrap();
        assert_eq!(result.unwrap().text, format!("echo: question {i}"));
    }

    // Serial execution would need 8 * delay.
    assert!(started.elapsed() < delay * 4, "took {:?}", started.elapsed());
}

struct FailingPrimaryFactory;

impl ModelFactory for FailingPrimaryFactory {
    fn connect(&self, model_id: &str, _: &str) -> Result<Arc<dyn GenerativeModel>, AiLlmError> {
        if model_id.contains("flash") {
            return Err(AiLlmError::Worker("primary unavailable".into()));
        }
        let mut model = StubModel::new(Reply::Raw(json!({ "text": "from fallback" })));
        model.id = model_id.to_string();
        Ok(Arc::new(model))
    }
}

#[tokio::test]
async fn fallback_model_serves_requests_when_primary_fails() {
    let pool = ModelHandlePool::init(
        "models/gemini-2.5-flash",
        "models/gemini-2.5-pro-latest",
        "test-key",
        Arc::new(FailingPrimaryFactory),
    )
    .await
    .unwrap();

    let status = pool.status();
    assert!(status.initialized);
    assert_eq!(status.role, Some(ModelRole::Fallback));
    assert_eq!(status.model.as_deref(), Some("models/gemini-2.5-pro-latest"));

    let orch = Orchestrator::with_parts(
        Arc::new(pool),
        PromptBuilder::new(2000),
        InferenceExecutor::new(1, Duration::from_secs(5), GenerationParams::default()),
    );
    assert_eq!(orch.ask("hi", None).await.unwrap().text, "from fallback");

    orch.pool().teardown().await;
    assert!(matches!(
        orch.ask("hi", None).await.unwrap_err(),
        AskError::NotInitialized
    ));
}
