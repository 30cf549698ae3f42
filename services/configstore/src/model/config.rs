//! Config and config-version records.
use crate::document::{ConfigFormat, Document};
use crate::validate::{ValidationError, normalize_config_path, validate_namespace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Canonical `(namespace, path)` identity of a config.
///
/// Only [`ConfigKey::new`] builds one, so holding a key means both parts have
/// already passed validation and path normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    namespace: String,
    path: String,
}

impl ConfigKey {
    pub fn new(namespace: &str, path: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            namespace: validate_namespace(namespace)?,
            path: normalize_config_path(path)?,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.path)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Config {
    pub id: Uuid,
    pub namespace: String,
    pub path: String,
    pub format: ConfigFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable revision of a config body.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ConfigVersion {
    pub id: Uuid,
    pub config_id: Uuid,
    pub version: u32,
    pub body_raw: String,
    #[schema(value_type = Object)]
    pub body_json: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub content_sha256: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

impl ConfigVersion {
    pub fn meta(&self) -> ConfigVersionMeta {
        ConfigVersionMeta {
            id: self.id,
            version: self.version,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            comment: self.comment.clone(),
            content_sha256: Some(self.content_sha256.clone()),
        }
    }
}

/// A version without its body.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ConfigVersionMeta {
    pub id: Uuid,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ConfigListItem {
    pub config: Config,
    pub latest_meta: ConfigVersionMeta,
}

/// A config paired with one of its versions, as returned by store reads and
/// writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWithVersion {
    pub config: Config,
    pub version: ConfigVersion,
}

/// Who and what caused a write, recorded on the version it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAudit {
    pub request_id: Option<String>,
    pub user_agent: Option<String>,
    pub source_ip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_normalizes_both_parts() {
        let key = ConfigKey::new(" team ", "/svc/app.yaml/").unwrap();
        assert_eq!(key.namespace(), "team");
        assert_eq!(key.path(), "svc/app.yaml");
        assert_eq!(key.to_string(), "team/svc/app.yaml");
        assert!(ConfigKey::new("bad ns", "a").is_err());
        assert!(ConfigKey::new("team", "a/../b").is_err());
    }

    #[test]
    fn config_keys_order_by_namespace_then_path() {
        let mut keys = vec![
            ConfigKey::new("b", "a").unwrap(),
            ConfigKey::new("a", "z").unwrap(),
            ConfigKey::new("a", "b/c").unwrap(),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a/b/c", "a/z", "b/a"]);
    }

    #[test]
    fn version_meta_drops_body_and_audit() {
        let version = ConfigVersion {
            id: Uuid::new_v4(),
            config_id: Uuid::new_v4(),
            version: 3,
            body_raw: "{}".to_string(),
            body_json: Document::Mapping(Default::default()),
            created_by: Some("ops".to_string()),
            comment: None,
            content_sha256: "abc".to_string(),
            created_at: Utc::now(),
            request_id: Some("req-1".to_string()),
            user_agent: None,
            source_ip: None,
        };
        let meta = version.meta();
        assert_eq!(meta.version, 3);
        assert_eq!(meta.content_sha256.as_deref(), Some("abc"));
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("body_raw").is_none());
        assert!(json.get("comment").is_none());
        assert_eq!(json["created_by"], "ops");
    }
}
