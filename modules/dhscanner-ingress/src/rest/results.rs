use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use dhscanner_logsink::LogMessage;
use dhscanner_model::{ArtifactKind, Context, JobId, JobStatus, Language};

use crate::auth::Authenticated;
use crate::rate_limit::Route;
use crate::rest::{ensure_approved, enforce_rate_limit};
use crate::AppState;

#[derive(Deserialize)]
pub struct ResultsQuery {
    job_id: String,
}

/// `POST /api/{approved_url}/results?job_id=...` — the finished SARIF
/// document, once the pipeline has reached its terminal status. Grounded
/// on `app/results.py`: a job still in flight gets a 202 with a "not ready
/// yet" message rather than an error, matching the polling contract
/// clients are expected to implement.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Path(approved_url): Path<String>,
    Query(query): Query<ResultsQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    _auth: Authenticated,
) -> impl IntoResponse {
    if let Err(rejection) = ensure_approved(&state, &approved_url) {
        return rejection.into_response();
    }
    if let Err(rejection) = enforce_rate_limit(&state, addr.ip(), Route::Results).await {
        return rejection.into_response();
    }

    let job_id = JobId::from_raw(query.job_id);
    state
        .logger
        .debug(LogMessage::new(
            job_id.as_str(),
            Context::IngressResultsRequested,
            "",
            Language::Unknown,
            Duration::ZERO,
        ))
        .await;

    let status = match state.coordinator.get_status(&job_id).await {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "coordinator not responding");
            return (StatusCode::INTERNAL_SERVER_ERROR, super::fatal_error(e.to_string())).into_response();
        }
    };

    if status != Some(JobStatus::Finished) {
        return (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"detail": "results are not ready yet ... stay tuned !"})),
        )
            .into_response();
    }

    let output_id = match state.store.latest_output_id(&job_id).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return (
                StatusCode::OK,
                super::fatal_error("job finished but produced no output"),
            )
                .into_response();
        }
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, super::fatal_error(e.to_string())).into_response();
        }
    };

    match state.store.load(&job_id, &ArtifactKind::Output, output_id).await {
        Ok(Some(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::OK,
            super::fatal_error("output artifact is missing from storage"),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, super::fatal_error(e.to_string())).into_response(),
    }
}
