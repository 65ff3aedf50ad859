use ai_llm_service::{PoolStatus, health_service::HealthStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct HealthParams {
    /// Run a live model probe in addition to the pool snapshot.
    #[serde(default)]
    pub probe: bool,
}

#[derive(Debug, Serialize)]
pub struct InferenceLoad {
    pub pool_size: usize,
    pub in_flight: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    pub model_pool: PoolStatus,
    pub inference: InferenceLoad,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<HealthStatus>,
}
