pub mod ai {
    pub mod ask_request;
    pub mod ask_route;
}

pub mod finance {
    pub mod quote_request;
    pub mod quote_route;
}

pub mod health {
    pub mod health_response;
    pub mod health_route;
}

pub mod uploads {
    pub mod presign_route;
    pub mod register_route;
    pub mod upload_request;
}

/// Request id from `X-Request-Id`, for log correlation.
pub(crate) fn request_id(headers: &axum::http::HeaderMap) -> &str {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
