//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Middleware
//! Outermost first: request-ID assignment, request-ID echo on the response,
//! the `http.request` trace span, the request timeout, then the body limit.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::config::ServerConfig;
use crate::observability;
use crate::store::ConfigStore;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConfigStore>,
    pub readiness_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ConfigStore>, server: &ServerConfig) -> Self {
        Self {
            store,
            readiness_timeout: Duration::from_millis(server.readiness_timeout_ms),
            request_timeout: Duration::from_millis(server.request_timeout_ms),
            max_body_bytes: server.max_body_bytes,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %request_id
            );
            span.set_parent(parent);
            span
        });
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_timeout = state.request_timeout;
    let max_body_bytes = state.max_body_bytes;
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/healthz", axum::routing::get(api::system::healthz))
        .route("/readyz", axum::routing::get(api::system::readyz))
        .route(
            "/namespaces",
            axum::routing::get(api::namespaces::list_namespaces)
                .post(api::namespaces::create_namespace),
        )
        .route(
            "/namespaces/:namespace",
            axum::routing::delete(api::namespaces::delete_namespace),
        )
        .route(
            "/namespaces/:namespace/browse",
            axum::routing::get(api::namespaces::browse_namespace),
        )
        .route("/configs", axum::routing::get(api::configs::list_configs))
        .route(
            "/configs/:namespace/*path",
            axum::routing::get(api::configs::get_config)
                .post(api::configs::create_config)
                .put(api::configs::update_config)
                .delete(api::configs::delete_config),
        )
        .route(
            "/openapi.json",
            axum::routing::get(move || async move { axum::Json(openapi) }),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}
