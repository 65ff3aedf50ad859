//! POST /ai/ask: answers a finance question with optional portfolio context.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::debug;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::{
        ai::ask_request::{AskRequest, AskResponse},
        request_id,
    },
};

/// Handler: POST /ai/ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/ai/ask \
///   -H 'content-type: application/json' \
///   -d '{"query":"Is my portfolio too concentrated?","portfolio":{"INFY":40,"TCS":60}}'
/// ```
pub async fn ask_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AskRequest>,
) -> AppResult<Json<AskResponse>> {
    let request_id = request_id(&headers);
    debug!(%request_id, "ask_route: start");

    let answer = state
        .orchestrator
        .ask(&body.query, body.portfolio.as_ref())
        .await
        .map_err(|err| {
            debug!(%request_id, code = err.code(), "ask_route: failed");
            err
        })?;

    debug!(%request_id, outcome = ?answer.outcome, "ask_route: success");
    Ok(Json(AskResponse {
        response_text: answer.text,
    }))
}
