//! Bearer-token authentication.
//!
//! One process-wide secret, compared in constant time. When no token is
//! configured the check is a no-op — local development runs open, and the
//! deployment is expected to set one in production.

use crate::config::ServiceConfig;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use subtle::ConstantTimeEq;

/// Whether the request presents the configured bearer token.
pub fn is_authorized(config: &ServiceConfig, headers: &HeaderMap) -> bool {
    let Some(expected) = &config.auth_token else {
        return true;
    };
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(presented) = value.strip_prefix("Bearer ") else {
        return false;
    };
    // Slice ct_eq already rejects unequal lengths; only the token bytes
    // themselves are compared in constant time.
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Gate for data endpoints: `Err` carries the ready-made 401 response.
pub fn require(config: &ServiceConfig, headers: &HeaderMap) -> Result<(), Response> {
    if is_authorized(config, headers) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "ok": false,
                "error": "unauthorized",
                "message": "Missing or invalid bearer token",
            })),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config_with_token(token: &str) -> ServiceConfig {
        ServiceConfig::builder().auth_token(token).build().unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn no_token_configured_allows_everything() {
        let config = ServiceConfig::default();
        assert!(is_authorized(&config, &HeaderMap::new()));
    }

    #[test]
    fn matching_token_passes() {
        let config = config_with_token("s3cret");
        assert!(is_authorized(&config, &headers_with("Bearer s3cret")));
    }

    #[test]
    fn wrong_missing_or_malformed_token_fails() {
        let config = config_with_token("s3cret");
        assert!(!is_authorized(&config, &HeaderMap::new()));
        assert!(!is_authorized(&config, &headers_with("Bearer nope")));
        assert!(!is_authorized(&config, &headers_with("s3cret")));
        assert!(!is_authorized(&config, &headers_with("Basic s3cret")));
        assert!(!is_authorized(&config, &headers_with("Bearer s3cret2")));
    }
}
