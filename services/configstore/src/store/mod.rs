//! Storage layer for namespaces, configs, and their version history.
//!
//! # Purpose
//! [`ConfigStore`] is the single seam between the HTTP handlers and a backend.
//! Two backends implement it: [`memory::InMemoryStore`] for development and
//! tests, and [`postgres::PostgresStore`] for durable deployments. Rules that
//! both must apply identically (version numbering, no-op detection, browse
//! grouping) live outside the backends in [`versioning`] and
//! [`crate::browse`].
//!
//! # Key invariants
//! - Every mutating call is one atomic operation scoped to a single config or
//!   namespace; concurrent writers to the same entity are serialized.
//! - Version numbers are assigned only here, as `max(version) + 1`.
//! - Failures are reported through [`StoreError`]; a failed write leaves no
//!   partial state behind.
use crate::cursor::{Page, PageRequest};
use crate::document::{ConfigFormat, DocumentError};
use crate::model::{
    BrowseEntry, ConfigKey, ConfigListItem, ConfigVersionMeta, ConfigWithVersion, Namespace,
    NamespaceWithCount, RequestAudit,
};
use crate::validate::{ValidationError, normalize_prefix, validate_namespace};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod versioning;

/// Why a write was refused because of existing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The named entity kind (`namespace` or `config`) already exists.
    AlreadyExists(&'static str),
    VersionMismatch {
        base_version: u32,
        current_version: u32,
    },
    NoChange {
        current_version: u32,
    },
    NamespaceNotEmpty {
        config_count: i64,
    },
    LatestVersion {
        latest_version: u32,
    },
}

impl ConflictReason {
    /// Stable machine-readable reason, reported as `details.reason`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "already_exists",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::NoChange { .. } => "no_change",
            Self::NamespaceNotEmpty { .. } => "namespace_not_empty",
            Self::LatestVersion { .. } => "latest_version",
        }
    }

    pub fn details(&self) -> Value {
        let reason = self.code();
        match self {
            Self::AlreadyExists(kind) => json!({ "reason": reason, "kind": kind }),
            Self::VersionMismatch {
                base_version,
                current_version,
            } => json!({
                "reason": reason,
                "base_version": base_version,
                "current_version": current_version,
            }),
            Self::NoChange { current_version } => {
                json!({ "reason": reason, "current_version": current_version })
            }
            Self::NamespaceNotEmpty { config_count } => {
                json!({ "reason": reason, "config_count": config_count })
            }
            Self::LatestVersion { latest_version } => {
                json!({ "reason": reason, "latest_version": latest_version })
            }
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists(kind) => write!(f, "{kind} already exists"),
            Self::VersionMismatch { .. } => f.write_str("base_version does not match current latest"),
            Self::NoChange { .. } => f.write_str("body_raw matches current latest"),
            Self::NamespaceNotEmpty { .. } => f.write_str("namespace is not empty"),
            Self::LatestVersion { .. } => f.write_str("cannot delete latest version"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),
    /// The named entity kind (`namespace`, `config`, `version`) does not exist.
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(ConflictReason),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<DocumentError> for StoreError {
    fn from(err: DocumentError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Unavailable(err.to_string())
            }
            other => Self::Unexpected(other.into()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Unexpected(err.into())
    }
}

/// Input for creating a config together with its first version.
#[derive(Debug, Clone)]
pub struct NewConfig {
    pub key: ConfigKey,
    pub format: ConfigFormat,
    pub body_raw: String,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub audit: RequestAudit,
}

/// Input for appending a version to an existing config.
#[derive(Debug, Clone)]
pub struct ConfigUpdate {
    pub key: ConfigKey,
    pub body_raw: String,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    /// When set, the update only applies if this is still the latest version.
    pub base_version: Option<u32>,
    pub audit: RequestAudit,
}

/// Selection for the flat config listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigListFilter {
    namespace: Option<String>,
    prefix: String,
    recursive: bool,
}

impl ConfigListFilter {
    pub fn new(
        namespace: Option<&str>,
        prefix: &str,
        recursive: bool,
    ) -> Result<Self, ValidationError> {
        let namespace = namespace.map(validate_namespace).transpose()?;
        Ok(Self {
            namespace,
            prefix: normalize_prefix(prefix)?,
            recursive,
        })
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn matches(&self, key: &ConfigKey) -> bool {
        if let Some(namespace) = &self.namespace {
            if key.namespace() != namespace {
                return false;
            }
        }
        let Some(rest) = key.path().strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        self.recursive || !rest.contains('/')
    }
}

impl Default for ConfigListFilter {
    fn default() -> Self {
        Self {
            namespace: None,
            prefix: String::new(),
            recursive: true,
        }
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Namespaces ordered by name, each with its config count.
    async fn list_namespaces(&self, page: PageRequest) -> StoreResult<Page<NamespaceWithCount>>;
    async fn create_namespace(&self, name: &str) -> StoreResult<Namespace>;
    /// Refused with `namespace_not_empty` while the namespace owns any config.
    async fn delete_namespace(&self, name: &str) -> StoreResult<()>;
    async fn namespace_exists(&self, name: &str) -> StoreResult<bool>;

    /// Folder view of the namespace below `prefix`.
    async fn browse(
        &self,
        namespace: &str,
        prefix: &str,
        page: PageRequest,
    ) -> StoreResult<Page<BrowseEntry>>;
    /// Configs ordered by `(namespace, path)` with their latest version metadata.
    async fn list_configs(
        &self,
        filter: &ConfigListFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ConfigListItem>>;

    async fn create_config(&self, new: NewConfig) -> StoreResult<ConfigWithVersion>;
    async fn update_config(&self, update: ConfigUpdate) -> StoreResult<ConfigWithVersion>;
    async fn get_latest(&self, key: &ConfigKey) -> StoreResult<ConfigWithVersion>;
    async fn get_version(&self, key: &ConfigKey, version: u32) -> StoreResult<ConfigWithVersion>;
    /// Versions newest first.
    async fn list_versions(
        &self,
        key: &ConfigKey,
        page: PageRequest,
    ) -> StoreResult<Page<ConfigVersionMeta>>;
    /// Refused with `latest_version` when `version` is the current latest.
    async fn delete_version(&self, key: &ConfigKey, version: u32) -> StoreResult<()>;
    /// Removes the config and its whole history.
    async fn delete_config(&self, key: &ConfigKey) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
