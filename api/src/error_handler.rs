use ai_llm_service::AskError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use market_quotes::QuoteError;
use serde::Serialize;
use thiserror::Error;
use upload_store::UploadError;

use crate::core::app_state::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Ask failures keep their stable codes; provider causes never reach the client.
impl From<AskError> for AppError {
    fn from(err: AskError) -> Self {
        let code = err.code();
        let (status, message) = match &err {
            AskError::InvalidInput => (StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()),
            AskError::NotInitialized => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI model not initialized".to_string(),
            ),
            AskError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "AI service timeout".to_string()),
            AskError::ProviderError(_) => (StatusCode::BAD_GATEWAY, "AI service error".to_string()),
        };
        AppError::Http {
            status,
            code,
            message,
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidSymbol => AppError::Http {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_SYMBOL",
                message: err.to_string(),
            },
            other => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "QUOTE_ERROR",
                message: format!("Stock data error: {other}"),
            },
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let (status, code) = match &err {
            UploadError::MissingFields => (StatusCode::BAD_REQUEST, "MISSING_FIELDS"),
            UploadError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            UploadError::Presign { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "PRESIGN_ERROR"),
            UploadError::Registry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REGISTRY_ERROR"),
            UploadError::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        };
        AppError::Http {
            status,
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn status_and_code(err: AppError) -> (StatusCode, &'static str) {
        (err.status_code(), err.error_code())
    }

    #[test]
    fn ask_errors_map_to_gateway_statuses() {
        assert_eq!(
            status_and_code(AskError::InvalidInput.into()),
            (StatusCode::BAD_REQUEST, "INVALID_INPUT")
        );
        assert_eq!(
            status_and_code(AskError::NotInitialized.into()),
            (StatusCode::INTERNAL_SERVER_ERROR, "MODEL_NOT_INITIALIZED")
        );
        assert_eq!(
            status_and_code(AskError::Timeout(Duration::from_secs(30)).into()),
            (StatusCode::GATEWAY_TIMEOUT, "AI_TIMEOUT")
        );
    }

    #[test]
    fn upload_errors_map_to_client_and_server_statuses() {
        let err: AppError = UploadError::MissingFields.into();
        assert_eq!(err.to_string(), "missing fields");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = UploadError::Presign {
            what: "download",
            reason: "expired credentials".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
