use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::debug;

use crate::{
    core::app_state::AppState,
    routes::health::health_response::{HealthParams, HealthResponse, InferenceLoad},
};

/// Handler: GET /health[?probe=true]
///
/// 200 while a model handle is held (and the probe, if requested, passed),
/// otherwise 503 with the same body.
pub async fn health_route(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HealthParams>,
) -> (StatusCode, Json<HealthResponse>) {
    let model_pool = state.orchestrator.pool().status();
    let executor = state.orchestrator.executor();

    let probe = match (&model_pool.model, &state.health, params.probe) {
        (Some(model), Some(health), true) => Some(health.check(model).await),
        _ => None,
    };

    let healthy = model_pool.initialized && probe.as_ref().is_none_or(|p| p.ok);
    debug!(healthy, probed = probe.is_some(), "health_route");

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        model_pool,
        inference: InferenceLoad {
            pool_size: executor.pool_size(),
            in_flight: executor.in_flight(),
        },
        probe,
    };
    (status, Json(body))
}
