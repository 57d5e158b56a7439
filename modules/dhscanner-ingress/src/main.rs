use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::Logger;
use dhscanner_store::ArtifactStore;

mod auth;
mod rate_limit;
mod rest;

use rate_limit::RateLimiter;

pub struct AppState {
    pub store: ArtifactStore,
    pub coordinator: StatusCoordinator,
    pub logger: Logger,
    pub config: Config,
    pub rate_limiter: Mutex<RateLimiter>,
}

impl AppState {
    /// `true` if `approved_url` names one of this deployment's configured
    /// clients, mirroring `app/main.py`'s per-`APPROVED_URL_{i}` routing.
    pub fn is_approved(&self, approved_url: &str) -> bool {
        self.config.approved_urls.iter().any(|u| u == approved_url)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dhscanner=info".parse()?))
        .init();

    let config = Config::ingress_from_env();
    config.log_redacted();

    let store = ArtifactStore::connect(&config.db_path, &config.artifact_root).await?;
    let coordinator = StatusCoordinator::connect(&config.redis_url).await?;
    let logger = Logger::new(config.log_sink_url.clone());

    let host = config.ingress_host.clone();
    let port = config.ingress_port;

    let state = Arc::new(AppState {
        store,
        coordinator,
        logger,
        config,
        rate_limiter: Mutex::new(RateLimiter::new()),
    });

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/{approved_url}/getjobid", get(rest::getjobid::handler))
        .route("/api/{approved_url}/upload", post(rest::upload::handler))
        .route("/api/{approved_url}/analyze", post(rest::analyze::handler))
        .route("/api/{approved_url}/status", post(rest::status::handler))
        .route("/api/{approved_url}/results", post(rest::results::handler))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    HeaderValue::from_static("x-path"),
                    HeaderValue::from_static("x-module-name-resolver-go.mod"),
                ]),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{host}:{port}");
    tracing::info!(%addr, "dhscanner ingress listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
