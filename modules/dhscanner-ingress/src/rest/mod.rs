//! REST handlers, one module per endpoint, grounded on `app/upload.py`,
//! `app/analyze.py`, `app/status.py`, and `app/results.py`. Each handler is
//! registered once in `main.rs` under a `{approved_url}` path parameter and
//! checks membership itself, matching the original's per-client routing
//! without needing one route registration per configured client.

pub mod analyze;
pub mod getjobid;
pub mod results;
pub mod status;
pub mod upload;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{http::StatusCode, response::Json};

use crate::rate_limit::{self, Route};
use crate::AppState;

/// 404 if `approved_url` doesn't name a configured client.
pub fn ensure_approved(state: &AppState, approved_url: &str) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if state.is_approved(approved_url) {
        Ok(())
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"detail": "unknown approved url"})),
        ))
    }
}

/// 429 if `ip` has exceeded `route`'s quota; records this request otherwise.
pub async fn enforce_rate_limit(
    state: &Arc<AppState>,
    ip: IpAddr,
    route: Route,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    let mut limiter = state.rate_limiter.lock().await;
    if limiter.len() > 10_000 {
        rate_limit::prune_empty_entries(&mut limiter);
    }
    let entries = limiter.entry((ip, route)).or_default();
    if rate_limit::check_rate_limit(entries, Instant::now(), route) {
        Ok(())
    } else {
        Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({"detail": "rate limit exceeded"})),
        ))
    }
}

pub fn fatal_error(detail: impl Into<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "fatal error", "detail": detail.into()}))
}
