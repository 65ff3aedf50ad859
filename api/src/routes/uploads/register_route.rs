use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use tracing::{debug, error};
use upload_store::{RegisteredUpload, UploadError};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::{request_id, uploads::upload_request::RegisterRequest},
};

/// Handler: POST /register
///
/// Any unreadable body or absent `username`/`s3_key` is a 400 "missing fields".
pub async fn register_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<RegisteredUpload>> {
    let request_id = request_id(&headers);

    let Ok(Json(body)) = payload else {
        debug!(%request_id, "register_route: unreadable body");
        return Err(UploadError::MissingFields.into());
    };
    let (Some(username), Some(s3_key), Some(size)) = (&body.username, &body.s3_key, body.size())
    else {
        return Err(UploadError::MissingFields.into());
    };
    let filename = body.filename.as_deref().unwrap_or_default();

    let registered = state
        .uploads
        .register_upload(username, s3_key, filename, size)
        .await
        .map_err(|err| {
            error!(%request_id, error = %err, "register_route: failed");
            err
        })?;

    Ok(Json(registered))
}
