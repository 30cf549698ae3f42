//! OpenAPI schema aggregation for the configstore API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document served
//! at `/openapi.json`.
use crate::api::{
    configs, namespaces, system,
    types::{
        BrowseResponse, ConfigCreateRequest, ConfigListResponse, ConfigResponse,
        ConfigUpdateRequest, ConfigVersionResponse, ErrorResponse, HealthStatus,
        NamespaceCreateRequest, NamespaceListResponse, VersionListResponse,
    },
};
use crate::model::{
    BrowseEntry, Config, ConfigFormat, ConfigListItem, ConfigVersion, ConfigVersionMeta,
    Namespace, NamespaceWithCount,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "configstore",
        version = "v1",
        description = "Versioned configuration store HTTP API"
    ),
    paths(
        system::healthz,
        system::readyz,
        namespaces::list_namespaces,
        namespaces::create_namespace,
        namespaces::delete_namespace,
        namespaces::browse_namespace,
        configs::list_configs,
        configs::get_config,
        configs::create_config,
        configs::update_config,
        configs::delete_config
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        Namespace,
        NamespaceWithCount,
        NamespaceCreateRequest,
        NamespaceListResponse,
        BrowseEntry,
        BrowseResponse,
        ConfigFormat,
        Config,
        ConfigVersion,
        ConfigVersionMeta,
        ConfigListItem,
        ConfigCreateRequest,
        ConfigUpdateRequest,
        ConfigListResponse,
        ConfigResponse,
        ConfigVersionResponse,
        VersionListResponse
    )),
    tags(
        (name = "system", description = "Liveness and readiness"),
        (name = "namespaces", description = "Namespace management and browsing"),
        (name = "configs", description = "Configs and their version history")
    )
)]
pub struct ApiDoc;
