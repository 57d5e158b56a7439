use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use dhscanner_logsink::LogMessage;
use dhscanner_model::{Context, JobId, Language};

use crate::auth::Authenticated;
use crate::rate_limit::Route;
use crate::rest::{ensure_approved, enforce_rate_limit};
use crate::AppState;

#[derive(Deserialize)]
pub struct UploadQuery {
    job_id: String,
}

const PATH_HEADER: &str = "x-path";
const GO_MODULE_NAME_HEADER: &str = "x-module-name-resolver-go.mod";

/// `POST /api/{approved_url}/upload?job_id=...` — stores one source file.
/// The caller names the file via the `X-Path` header (the original upload
/// endpoint, `app/upload.py`, reads the relative path the same way) and
/// streams the raw bytes as the request body; only
/// `application/octet-stream` bodies are accepted. A Go source file may
/// carry its module name via `X-Module-Name-Resolver-Go.mod`, which rides
/// along to the native-parsing stage as a resolver hint.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Path(approved_url): Path<String>,
    Query(query): Query<UploadQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    _auth: Authenticated,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Err(rejection) = ensure_approved(&state, &approved_url) {
        return rejection.into_response();
    }
    if let Err(rejection) = enforce_rate_limit(&state, addr.ip(), Route::Upload).await {
        return rejection.into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != "application/octet-stream" {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"detail": "Content-Type must be application/octet-stream"})),
        )
            .into_response();
    }

    let Some(filename) = headers.get(PATH_HEADER).and_then(|v| v.to_str().ok()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"detail": "X-Path header is required"})),
        )
            .into_response();
    };
    let filename = filename.to_string();
    let job_id = JobId::from_raw(query.job_id);
    let language = Language::from_filename(&filename);
    let go_module_name = headers.get(GO_MODULE_NAME_HEADER).and_then(|v| v.to_str().ok());

    let Some(language) = language else {
        state
            .logger
            .info(
                LogMessage::new(
                    job_id.as_str(),
                    Context::NativeParsingSkipped,
                    &filename,
                    Language::Unknown,
                    Duration::ZERO,
                )
                .with_byte_size(body.len() as u64),
            )
            .await;
        return (
            StatusCode::OK,
            Json(serde_json::json!({"status": "ok", "original_upload_filename": filename})),
        )
            .into_response();
    };

    let started = Instant::now();
    let result = state
        .store
        .save_source_file(&job_id, &filename, language, go_module_name, &body)
        .await;

    let (context, level_ok) = match &result {
        Ok(_) => (Context::ReadSourceFileSucceeded, true),
        Err(_) => (Context::ReadSourceFileFailed, false),
    };
    let log_message = LogMessage::new(job_id.as_str(), context, &filename, language, started.elapsed())
        .with_byte_size(body.len() as u64);
    if level_ok {
        state.logger.info(log_message).await;
    } else {
        state.logger.error(log_message).await;
    }

    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "ok", "original_upload_filename": filename})),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "failed to store uploaded file");
            (StatusCode::INTERNAL_SERVER_ERROR, super::fatal_error(e.to_string())).into_response()
        }
    }
}
