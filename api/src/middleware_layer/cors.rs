//! Origin allow-list CORS with credentials.
//!
//! Preflights from allowed origins are answered here with any requested
//! method and headers; other requests get the allow-origin headers appended
//! to whatever the router produced.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderValue, Method, Request, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::core::app_state::ConfigError;

const ALLOWED_METHODS: &str = "DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT";
const PREFLIGHT_MAX_AGE: &str = "600";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<HeaderValue>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .map(|o| {
                let o = o.as_ref().trim_end_matches('/');
                HeaderValue::from_str(o).map_err(|_| ConfigError::CorsOrigin(o.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { origins })
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    fn allowed_origin(&self, headers: &HeaderMap) -> Option<HeaderValue> {
        headers.get(ORIGIN).filter(|o| self.allows(o)).cloned()
    }
}

pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = policy.allowed_origin(req.headers());
    let is_preflight = req.method() == Method::OPTIONS
        && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);

    if is_preflight {
        let Some(origin) = origin else {
            debug!("preflight from disallowed origin");
            return (StatusCode::BAD_REQUEST, "Disallowed CORS origin").into_response();
        };
        let mut res = StatusCode::OK.into_response();
        let headers = res.headers_mut();
        apply_origin(headers, origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        if let Some(requested) = req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
        headers.insert(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE),
        );
        return res;
    }

    let mut res = next.run(req).await;
    if let Some(origin) = origin {
        apply_origin(res.headers_mut(), origin);
    }
    res
}

fn apply_origin(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_ignored_in_config() {
        let policy = CorsPolicy::new(["http://localhost:3000/"]).unwrap();
        assert!(policy.allows(&HeaderValue::from_static("http://localhost:3000")));
        assert!(!policy.allows(&HeaderValue::from_static("http://evil.test")));
    }

    #[test]
    fn invalid_origin_is_a_config_error() {
        assert!(matches!(
            CorsPolicy::new(["http://bad\norigin"]),
            Err(ConfigError::CorsOrigin(_))
        ));
    }
}
