use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use dhscanner_logsink::LogMessage;
use dhscanner_model::{Context, JobId, Language};

use crate::auth::Authenticated;
use crate::rate_limit::Route;
use crate::rest::{ensure_approved, enforce_rate_limit};
use crate::AppState;

#[derive(Deserialize)]
pub struct StatusQuery {
    job_id: String,
}

/// `POST /api/{approved_url}/status?job_id=...` — reports the job's current
/// pipeline status, grounded on `app/status.py`. An unknown job id is
/// reported as a fatal error rather than a plain 404, matching the
/// original's response shape.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Path(approved_url): Path<String>,
    Query(query): Query<StatusQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    _auth: Authenticated,
) -> impl IntoResponse {
    if let Err(rejection) = ensure_approved(&state, &approved_url) {
        return rejection.into_response();
    }
    if let Err(rejection) = enforce_rate_limit(&state, addr.ip(), Route::Status).await {
        return rejection.into_response();
    }

    let job_id = JobId::from_raw(query.job_id);
    state
        .logger
        .debug(LogMessage::new(
            job_id.as_str(),
            Context::IngressStatusRequested,
            "",
            Language::Unknown,
            Duration::ZERO,
        ))
        .await;

    match state.coordinator.get_status(&job_id).await {
        Ok(Some(status)) => {
            (StatusCode::OK, Json(serde_json::json!({"status": status.as_str()}))).into_response()
        }
        Ok(None) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": format!("fatal error processing job(id): {}", job_id.as_str())
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "coordinator not responding");
            (StatusCode::INTERNAL_SERVER_ERROR, super::fatal_error(e.to_string())).into_response()
        }
    }
}
