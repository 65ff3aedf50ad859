use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::debug;
use upload_store::UploadCredential;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::{request_id, uploads::upload_request::PresignRequest},
};

/// Handler: POST /presign
///
/// Returns a signed `PUT` URL plus the headers (`fields`) the client must
/// send with the upload, and the object key to pass to `/register` after.
pub async fn presign_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PresignRequest>,
) -> AppResult<Json<UploadCredential>> {
    debug!(request_id = %request_id(&headers), username = %body.username, "presign_route: start");

    let credential = state
        .uploads
        .issue_upload_credential(&body.username, &body.filename, &body.content_type)
        .await?;

    Ok(Json(credential))
}
