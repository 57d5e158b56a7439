//! Bearer-token check, grounded on `app/authentication.py`: a request is
//! rejected with 401 if the `Authorization` header is missing or doesn't
//! start with `"Bearer "`, and with 403 if the token itself doesn't match.

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};

use crate::AppState;

const SCHEME_PREFIX: &str = "Bearer ";

/// Marker extractor: presence in a handler's signature means the request
/// carried a valid bearer token for this deployment.
pub struct Authenticated;

impl FromRequestParts<std::sync::Arc<AppState>> for Authenticated {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &std::sync::Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let Some(header) = header else {
            return Err((StatusCode::UNAUTHORIZED, "missing Authorization header"));
        };

        let Some(token) = header.strip_prefix(SCHEME_PREFIX) else {
            return Err((StatusCode::UNAUTHORIZED, "Authorization header must use the Bearer scheme"));
        };

        if !constant_time_eq(token.as_bytes(), state.config.bearer_token.as_bytes()) {
            return Err((StatusCode::FORBIDDEN, "invalid bearer token"));
        }

        Ok(Authenticated)
    }
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_slices_compare_equal() {
        assert!(constant_time_eq(b"secret", b"secret"));
    }

    #[test]
    fn different_lengths_are_unequal() {
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }

    #[test]
    fn different_bytes_are_unequal() {
        assert!(!constant_time_eq(b"secret", b"secrrt"));
    }
}
