//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the payload shapes of the REST API and its OpenAPI schema. Request
//! bodies reject unknown fields.
use crate::cursor::Page;
use crate::model::{
    BrowseEntry, Config, ConfigListItem, ConfigVersion, ConfigVersionMeta, ConfigWithVersion,
    NamespaceWithCount,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct NamespaceCreateRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigCreateRequest {
    /// `json` or `yaml`.
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub body_raw: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigUpdateRequest {
    #[serde(default)]
    pub body_raw: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    /// Apply only if this is still the latest version.
    #[serde(default)]
    pub base_version: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NamespaceListResponse {
    pub items: Vec<NamespaceWithCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BrowseResponse {
    pub items: Vec<BrowseEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ConfigListResponse {
    pub items: Vec<ConfigListItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct VersionListResponse {
    pub items: Vec<ConfigVersionMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// A config with its latest version.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ConfigResponse {
    pub config: Config,
    pub latest: ConfigVersion,
}

/// A config with one specific version.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ConfigVersionResponse {
    pub config: Config,
    pub version: ConfigVersion,
}

impl From<Page<NamespaceWithCount>> for NamespaceListResponse {
    fn from(page: Page<NamespaceWithCount>) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

impl From<Page<BrowseEntry>> for BrowseResponse {
    fn from(page: Page<BrowseEntry>) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

impl From<Page<ConfigListItem>> for ConfigListResponse {
    fn from(page: Page<ConfigListItem>) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

impl From<Page<ConfigVersionMeta>> for VersionListResponse {
    fn from(page: Page<ConfigVersionMeta>) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

impl From<ConfigWithVersion> for ConfigResponse {
    fn from(found: ConfigWithVersion) -> Self {
        Self {
            config: found.config,
            latest: found.version,
        }
    }
}

impl From<ConfigWithVersion> for ConfigVersionResponse {
    fn from(found: ConfigWithVersion) -> Self {
        Self {
            config: found.config,
            version: found.version,
        }
    }
}
