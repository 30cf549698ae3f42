//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint answers
//! with the same `{code, message, details?, request_id?}` shape, and maps
//! store, validation, and cursor failures onto status codes.
//!
//! # Key invariants and assumptions
//! - `code` is one of `invalid_input`, `not_found`, `conflict`, `internal`,
//!   `unavailable`.
//! - Conflicts always carry `details.reason`.
//! - Internal errors log details server-side but return generic messages.
use crate::api::types::ErrorResponse;
use crate::cursor::CursorError;
use crate::store::{ConflictReason, StoreError};
use crate::validate::ValidationError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};

/// Structured API error returned by handlers.
///
/// `status` must match the semantics of `body.code`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: &str, details: Option<Value>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
                details,
                request_id: None,
            },
        }
    }

    /// Attach the request ID of the request that failed.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.body.request_id = request_id;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build a 400 error. `field` names the offending input when there is one.
pub fn api_invalid_input(message: &str, field: Option<&str>) -> ApiError {
    let details = field.map(|field| json!({ "field": field }));
    ApiError::new(StatusCode::BAD_REQUEST, "invalid_input", message, details)
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message, None)
}

/// Build a 409 error and count it by reason.
pub fn api_conflict(reason: &ConflictReason) -> ApiError {
    metrics::counter!("configstore_conflicts_total", "reason" => reason.code()).increment(1);
    ApiError::new(
        StatusCode::CONFLICT,
        "conflict",
        &reason.to_string(),
        Some(reason.details()),
    )
}

pub fn api_unavailable(message: &str) -> ApiError {
    ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message, None)
}

/// Build a 500 error; the store error is logged, not returned.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "configstore storage error");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message, None)
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::InvalidInput(message) => api_invalid_input(message, None),
            StoreError::NotFound(_) => api_not_found(&err.to_string()),
            StoreError::Conflict(reason) => api_conflict(reason),
            StoreError::Unavailable(message) => {
                tracing::warn!(error = %message, "configstore storage unavailable");
                api_unavailable("storage unavailable")
            }
            StoreError::Unexpected(_) => api_internal("internal error", &err),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        api_invalid_input(&err.to_string(), Some(err.field()))
    }
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        api_invalid_input(&err.to_string(), Some("cursor"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status_and_code() {
        let cases = [
            (
                StoreError::InvalidInput("body_raw is required".into()),
                StatusCode::BAD_REQUEST,
                "invalid_input",
            ),
            (
                StoreError::NotFound("namespace".into()),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                StoreError::Conflict(ConflictReason::AlreadyExists("config")),
                StatusCode::CONFLICT,
                "conflict",
            ),
            (
                StoreError::Unavailable("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
            ),
            (
                StoreError::Unexpected(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, code);
        }
    }

    #[test]
    fn not_found_names_the_entity() {
        let api = ApiError::from(StoreError::NotFound("version".into()));
        assert_eq!(api.body.message, "version not found");
        assert!(api.body.details.is_none());
    }

    #[test]
    fn conflicts_carry_reason_details() {
        let api = ApiError::from(StoreError::Conflict(ConflictReason::NoChange {
            current_version: 4,
        }));
        assert_eq!(api.body.message, "body_raw matches current latest");
        let details = api.body.details.expect("details");
        assert_eq!(details["reason"], "no_change");
        assert_eq!(details["current_version"], 4);
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let api = ApiError::from(StoreError::Unexpected(anyhow::anyhow!("secret dsn")));
        assert_eq!(api.body.message, "internal error");
    }

    #[test]
    fn validation_errors_report_the_field() {
        let api = ApiError::from(ValidationError::InvalidLimit);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.message, "limit must be an integer between 1 and 500");
        assert_eq!(api.body.details.expect("details")["field"], "limit");

        let api = ApiError::from(CursorError::OutOfRange);
        assert_eq!(api.body.details.expect("details")["field"], "cursor");
    }

    #[test]
    fn request_id_is_attached_on_demand() {
        let api = api_not_found("config not found").with_request_id(Some("req-9".into()));
        assert_eq!(api.body.request_id.as_deref(), Some("req-9"));
    }
}
