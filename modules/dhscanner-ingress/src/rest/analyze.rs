use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use dhscanner_logsink::LogMessage;
use dhscanner_model::{Context, JobId, JobStatus, Language};

use crate::auth::Authenticated;
use crate::rate_limit::Route;
use crate::rest::{ensure_approved, enforce_rate_limit};
use crate::AppState;

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    job_id: String,
}

/// `POST /api/{approved_url}/analyze?job_id=...` — kicks off the pipeline
/// for a job whose files have already been uploaded, registering it with
/// the status coordinator as `WaitingForNativeParsing` so the
/// native-parser stage picks it up on its next tick. This is the first
/// time the coordinator learns about the job at all. Grounded on
/// `app/analyze.py`.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Path(approved_url): Path<String>,
    Query(query): Query<AnalyzeQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    _auth: Authenticated,
) -> impl IntoResponse {
    if let Err(rejection) = ensure_approved(&state, &approved_url) {
        return rejection.into_response();
    }
    if let Err(rejection) = enforce_rate_limit(&state, addr.ip(), Route::Analyze).await {
        return rejection.into_response();
    }

    let job_id = JobId::from_raw(query.job_id);
    match state.coordinator.set_status(&job_id, JobStatus::WaitingForNativeParsing).await {
        Ok(()) => {
            state
                .logger
                .info(LogMessage::new(
                    job_id.as_str(),
                    Context::IngressAnalyzeRequested,
                    "",
                    Language::Unknown,
                    Duration::ZERO,
                ))
                .await;
            (
                StatusCode::OK,
                Json(serde_json::json!({"status": "ok", "started_analyzing_job_id": job_id.as_str()})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "failed to start analysis");
            (StatusCode::INTERNAL_SERVER_ERROR, super::fatal_error(e.to_string())).into_response()
        }
    }
}
