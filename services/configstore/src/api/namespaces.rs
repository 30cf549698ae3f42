//! Namespace API handlers.
//!
//! # Purpose
//! Implements namespace listing, creation, deletion, and the folder-style
//! browse view over a namespace's config paths.
use crate::api::error::ApiError;
use crate::api::types::{BrowseResponse, NamespaceCreateRequest, NamespaceListResponse};
use crate::api::{QueryParams, RawBody, decode_json_body, parse_page, query_string};
use crate::app::AppState;
use crate::cursor::{DEFAULT_BROWSE_LIMIT, DEFAULT_PAGE_LIMIT};
use crate::model::Namespace;
use crate::validate::{normalize_prefix, validate_namespace, validate_namespace_name};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/namespaces",
    tag = "namespaces",
    params(
        ("limit" = Option<u32>, Query, description = "Page size, 1-500 (default 50)"),
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous page")
    ),
    responses(
        (status = 200, description = "Namespaces ordered by name", body = NamespaceListResponse),
        (status = 400, description = "Invalid limit or cursor", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_namespaces(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<NamespaceListResponse>, ApiError> {
    let page = parse_page(&params, DEFAULT_PAGE_LIMIT)?;
    let namespaces = state.store.list_namespaces(page).await?;
    Ok(Json(namespaces.into()))
}

#[utoipa::path(
    post,
    path = "/namespaces",
    tag = "namespaces",
    request_body = NamespaceCreateRequest,
    responses(
        (status = 201, description = "Namespace created", body = Namespace),
        (status = 400, description = "Invalid name or body", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Namespace already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_namespace(
    State(state): State<AppState>,
    body: RawBody,
) -> Result<impl IntoResponse, ApiError> {
    let request: NamespaceCreateRequest = decode_json_body(body)?;
    let name = validate_namespace_name(&request.name)?;
    let namespace = state.store.create_namespace(&name).await?;
    tracing::info!(namespace = %namespace.name, "namespace created");
    Ok((StatusCode::CREATED, Json(namespace)))
}

#[utoipa::path(
    delete,
    path = "/namespaces/{namespace}",
    tag = "namespaces",
    params(
        ("namespace" = String, Path, description = "Namespace name")
    ),
    responses(
        (status = 204, description = "Namespace deleted"),
        (status = 404, description = "Namespace not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Namespace still owns configs", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_namespace(
    Path(namespace): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let namespace = validate_namespace(&namespace)?;
    state.store.delete_namespace(&namespace).await?;
    tracing::info!(%namespace, "namespace deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/namespaces/{namespace}/browse",
    tag = "namespaces",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("prefix" = Option<String>, Query, description = "Folder to list; empty for the root"),
        ("limit" = Option<u32>, Query, description = "Page size, 1-500 (default 200)"),
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous page")
    ),
    responses(
        (status = 200, description = "Folders and configs directly below the prefix", body = BrowseResponse),
        (status = 400, description = "Invalid prefix, limit, or cursor", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Namespace not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn browse_namespace(
    Path(namespace): Path<String>,
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let namespace = validate_namespace(&namespace)?;
    let prefix = normalize_prefix(query_string(&params, "prefix"))?;
    let page = parse_page(&params, DEFAULT_BROWSE_LIMIT)?;
    let entries = state.store.browse(&namespace, &prefix, page).await?;
    Ok(Json(entries.into()))
}
