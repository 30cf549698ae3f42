//! Version-numbering rules shared by every backend.
//!
//! A backend locks the config, reads the current latest version number and
//! fingerprint, and asks [`plan_update`] what to insert. The checks run in a
//! fixed order: stale `base_version` first, then the no-op guard, then body
//! parsing. The first failing check decides the error.
use super::{ConfigUpdate, ConflictReason, StoreError, StoreResult};
use crate::document::{ConfigFormat, Document};
use crate::fingerprint::fingerprint;
use crate::model::{ConfigVersion, RequestAudit};
use anyhow::anyhow;
use chrono::Utc;
use uuid::Uuid;

/// The version a write will insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedVersion {
    pub number: u32,
    pub fingerprint: String,
    pub document: Document,
}

impl PlannedVersion {
    /// The version row to persist for `config_id`.
    pub fn into_version(
        self,
        config_id: Uuid,
        body_raw: String,
        comment: Option<String>,
        created_by: Option<String>,
        audit: RequestAudit,
    ) -> ConfigVersion {
        ConfigVersion {
            id: Uuid::new_v4(),
            config_id,
            version: self.number,
            body_raw,
            body_json: self.document,
            created_by,
            comment,
            content_sha256: self.fingerprint,
            created_at: Utc::now(),
            request_id: audit.request_id,
            user_agent: audit.user_agent,
            source_ip: audit.source_ip,
        }
    }
}

fn require_body(body_raw: &str) -> StoreResult<()> {
    if body_raw.is_empty() {
        return Err(StoreError::InvalidInput("body_raw is required".to_string()));
    }
    Ok(())
}

/// Version 1 of a new config.
pub fn plan_initial(format: ConfigFormat, body_raw: &str) -> StoreResult<PlannedVersion> {
    require_body(body_raw)?;
    let document = Document::parse(format, body_raw)?;
    Ok(PlannedVersion {
        number: 1,
        fingerprint: fingerprint(body_raw.as_bytes()),
        document,
    })
}

/// The version that `update` appends after `current_latest`.
///
/// `latest_fingerprint` is the fingerprint of version `current_latest`, or
/// `None` when the config has no versions.
pub fn plan_update(
    current_latest: u32,
    latest_fingerprint: Option<&str>,
    format: ConfigFormat,
    update: &ConfigUpdate,
) -> StoreResult<PlannedVersion> {
    require_body(&update.body_raw)?;
    if let Some(base_version) = update.base_version {
        if base_version != current_latest {
            return Err(StoreError::Conflict(ConflictReason::VersionMismatch {
                base_version,
                current_version: current_latest,
            }));
        }
    }

    let next_fingerprint = fingerprint(update.body_raw.as_bytes());
    if latest_fingerprint == Some(next_fingerprint.as_str()) {
        return Err(StoreError::Conflict(ConflictReason::NoChange {
            current_version: current_latest,
        }));
    }

    let document = Document::parse(format, &update.body_raw)?;
    let number = current_latest
        .checked_add(1)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("version number overflow")))?;
    Ok(PlannedVersion {
        number,
        fingerprint: next_fingerprint,
        document,
    })
}

/// Refuse to delete the version that is currently latest.
pub fn check_deletable(version: u32, latest: u32) -> StoreResult<()> {
    if version == latest {
        return Err(StoreError::Conflict(ConflictReason::LatestVersion {
            latest_version: latest,
        }));
    }
    Ok(())
}
