use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use dhscanner_logsink::LogMessage;
use dhscanner_model::{Context, JobId, Language};

use crate::auth::Authenticated;
use crate::rate_limit::Route;
use crate::rest::{ensure_approved, enforce_rate_limit};
use crate::AppState;

/// `GET /api/{approved_url}/getjobid` — mints a fresh job id. Grounded on
/// `app/main.py`'s job-id handler, which only returned
/// `secrets.token_hex(16)`; the coordinator does not learn about the job
/// until `analyze` sets its first status, so a `status` call in between
/// reports "unknown job" rather than some synthetic "created" state.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Path(approved_url): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    _auth: Authenticated,
) -> impl IntoResponse {
    if let Err(rejection) = ensure_approved(&state, &approved_url) {
        return rejection.into_response();
    }
    if let Err(rejection) = enforce_rate_limit(&state, addr.ip(), Route::GetJobId).await {
        return rejection.into_response();
    }

    let job_id = JobId::new();

    state
        .logger
        .info(LogMessage::new(
            job_id.as_str(),
            Context::JobCreated,
            "",
            Language::Unknown,
            Duration::ZERO,
        ))
        .await;

    (StatusCode::OK, Json(serde_json::json!({"job_id": job_id.as_str()}))).into_response()
}
