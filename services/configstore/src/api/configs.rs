//! Config API handlers.
//!
//! # Purpose
//! Implements the flat config listing and every operation on a single config
//! and its versions.
//!
//! # Routing
//! Config paths contain slashes, so everything after `/configs/{namespace}/`
//! is captured as one wildcard and dispatched by [`ConfigTarget::parse`]: a
//! trailing `versions` segment selects the version list, and
//! `versions/{n}` selects one version. Anything else is the config path.
use crate::api::error::ApiError;
use crate::api::types::{
    ConfigCreateRequest, ConfigListResponse, ConfigResponse, ConfigUpdateRequest,
    ConfigVersionResponse, VersionListResponse,
};
use crate::api::{
    QueryParams, RawBody, decode_json_body, parse_optional_bool, parse_page, query_string,
    request_audit,
};
use crate::app::AppState;
use crate::cursor::DEFAULT_PAGE_LIMIT;
use crate::document::ConfigFormat;
use crate::model::ConfigKey;
use crate::store::{ConfigListFilter, ConfigUpdate, NewConfig};
use crate::validate::{ValidationError, parse_version_number};
use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

const VERSIONS_SEGMENT: &str = "versions";

/// What a `/configs/{namespace}/{rest}` URL addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigTarget {
    Config(ConfigKey),
    Versions(ConfigKey),
    Version(ConfigKey, u32),
}

impl ConfigTarget {
    pub(crate) fn parse(namespace: &str, rest: &str) -> Result<Self, ValidationError> {
        let trimmed = rest.trim().trim_end_matches('/');
        if let Some(path) = trimmed.strip_suffix(VERSIONS_SEGMENT) {
            if let Some(path) = path.strip_suffix('/').filter(|path| !path.is_empty()) {
                return Ok(Self::Versions(ConfigKey::new(namespace, path)?));
            }
        }
        if let Some((head, number)) = trimmed.rsplit_once('/') {
            if let Some(path) = head
                .strip_suffix(VERSIONS_SEGMENT)
                .and_then(|path| path.strip_suffix('/'))
                .filter(|path| !path.is_empty())
            {
                let key = ConfigKey::new(namespace, path)?;
                return Ok(Self::Version(key, parse_version_number(number)?));
            }
        }
        Ok(Self::Config(ConfigKey::new(namespace, rest)?))
    }
}

fn method_not_allowed() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}

#[utoipa::path(
    get,
    path = "/configs",
    tag = "configs",
    params(
        ("namespace" = Option<String>, Query, description = "Only configs in this namespace"),
        ("prefix" = Option<String>, Query, description = "Only paths below this prefix"),
        ("recursive" = Option<bool>, Query, description = "Include nested paths (default true)"),
        ("limit" = Option<u32>, Query, description = "Page size, 1-500 (default 50)"),
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous page")
    ),
    responses(
        (status = 200, description = "Configs ordered by namespace and path", body = ConfigListResponse),
        (status = 400, description = "Invalid filter, limit, or cursor", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_configs(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<ConfigListResponse>, ApiError> {
    let page = parse_page(&params, DEFAULT_PAGE_LIMIT)?;
    let namespace = Some(query_string(&params, "namespace").trim()).filter(|ns| !ns.is_empty());
    let recursive = parse_optional_bool(&params, "recursive")?.unwrap_or(true);
    let filter = ConfigListFilter::new(namespace, query_string(&params, "prefix"), recursive)?;
    let configs = state.store.list_configs(&filter, page).await?;
    Ok(Json(configs.into()))
}

#[utoipa::path(
    get,
    path = "/configs/{namespace}/{path}",
    tag = "configs",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("path" = String, Path, description = "Config path; may end in /versions or /versions/{n}"),
        ("limit" = Option<u32>, Query, description = "Version page size (version list only)"),
        ("cursor" = Option<String>, Query, description = "Version page cursor (version list only)")
    ),
    responses(
        (status = 200, description = "Latest version, one version, or the version list", body = ConfigResponse),
        (status = 400, description = "Invalid path or version", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Config or version not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_config(
    Path((namespace, rest)): Path<(String, String)>,
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    match ConfigTarget::parse(&namespace, &rest)? {
        ConfigTarget::Config(key) => {
            let found = state.store.get_latest(&key).await?;
            Ok(Json(ConfigResponse::from(found)).into_response())
        }
        ConfigTarget::Versions(key) => {
            let page = parse_page(&params, DEFAULT_PAGE_LIMIT)?;
            let versions = state.store.list_versions(&key, page).await?;
            Ok(Json(VersionListResponse::from(versions)).into_response())
        }
        ConfigTarget::Version(key, version) => {
            let found = state.store.get_version(&key, version).await?;
            Ok(Json(ConfigVersionResponse::from(found)).into_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/configs/{namespace}/{path}",
    tag = "configs",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("path" = String, Path, description = "Config path")
    ),
    request_body = ConfigCreateRequest,
    responses(
        (status = 201, description = "Config created at version 1", body = ConfigResponse),
        (status = 400, description = "Invalid path, format, or body", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Namespace not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Config already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_config(
    Path((namespace, rest)): Path<(String, String)>,
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: RawBody,
) -> Result<Response, ApiError> {
    let ConfigTarget::Config(key) = ConfigTarget::parse(&namespace, &rest)? else {
        return Ok(method_not_allowed());
    };
    let audit = request_audit(&headers, peer.map(|ConnectInfo(addr)| addr));
    let request_id = audit.request_id.clone();
    let request: ConfigCreateRequest = decode_json_body(body)?;
    let format: ConfigFormat = request
        .format
        .parse()
        .map_err(|_| ValidationError::InvalidFormat)?;
    let created = state
        .store
        .create_config(NewConfig {
            key,
            format,
            body_raw: request.body_raw,
            comment: request.comment,
            created_by: request.created_by,
            audit,
        })
        .await
        .map_err(|err| ApiError::from(err).with_request_id(request_id))?;
    tracing::info!(
        namespace = %created.config.namespace,
        path = %created.config.path,
        version = created.version.version,
        "config created"
    );
    Ok((StatusCode::CREATED, Json(ConfigResponse::from(created))).into_response())
}

#[utoipa::path(
    put,
    path = "/configs/{namespace}/{path}",
    tag = "configs",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("path" = String, Path, description = "Config path")
    ),
    request_body = ConfigUpdateRequest,
    responses(
        (status = 200, description = "New latest version appended", body = ConfigResponse),
        (status = 400, description = "Invalid path or body", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Config not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Stale base_version or unchanged body", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_config(
    Path((namespace, rest)): Path<(String, String)>,
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: RawBody,
) -> Result<Response, ApiError> {
    let ConfigTarget::Config(key) = ConfigTarget::parse(&namespace, &rest)? else {
        return Ok(method_not_allowed());
    };
    let audit = request_audit(&headers, peer.map(|ConnectInfo(addr)| addr));
    let request_id = audit.request_id.clone();
    let request: ConfigUpdateRequest = decode_json_body(body)?;
    let updated = state
        .store
        .update_config(ConfigUpdate {
            key,
            body_raw: request.body_raw,
            comment: request.comment,
            created_by: request.created_by,
            base_version: request.base_version,
            audit,
        })
        .await
        .map_err(|err| ApiError::from(err).with_request_id(request_id))?;
    tracing::info!(
        namespace = %updated.config.namespace,
        path = %updated.config.path,
        version = updated.version.version,
        "config updated"
    );
    Ok(Json(ConfigResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/configs/{namespace}/{path}",
    tag = "configs",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("path" = String, Path, description = "Config path, or {path}/versions/{n} for one version")
    ),
    responses(
        (status = 204, description = "Config or version deleted"),
        (status = 400, description = "Invalid path or version", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Config or version not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Version is the current latest", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_config(
    Path((namespace, rest)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    match ConfigTarget::parse(&namespace, &rest)? {
        ConfigTarget::Config(key) => {
            state.store.delete_config(&key).await?;
            tracing::info!(config = %key, "config deleted");
        }
        ConfigTarget::Version(key, version) => {
            state.store.delete_version(&key, version).await?;
            tracing::info!(config = %key, version, "config version deleted");
        }
        ConfigTarget::Versions(_) => return Ok(method_not_allowed()),
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
