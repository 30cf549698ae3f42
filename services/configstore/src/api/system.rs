//! Liveness and readiness probes.
//!
//! Liveness never touches the store. Readiness pings the store and gives up
//! after the configured readiness timeout.
use crate::api::error::{ApiError, api_unavailable};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "system",
    responses(
        (status = 200, description = "Process is alive", body = HealthStatus)
    )
)]
pub(crate) async fn healthz() -> Json<HealthStatus> {
    Json(HealthStatus { ok: true })
}

#[utoipa::path(
    get,
    path = "/readyz",
    tag = "system",
    responses(
        (status = 200, description = "Storage reachable", body = HealthStatus),
        (status = 503, description = "Storage unreachable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn readyz(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    match tokio::time::timeout(state.readiness_timeout, state.store.health_check()).await {
        Ok(Ok(())) => Ok(Json(HealthStatus { ok: true })),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, backend = state.store.backend_name(), "readiness check failed");
            Err(api_unavailable("database not reachable"))
        }
        Err(_) => {
            tracing::warn!(backend = state.store.backend_name(), "readiness check timed out");
            Err(api_unavailable("database not reachable"))
        }
    }
}
