//! In-memory implementation of the config store.
//!
//! # Purpose
//! Implements [`ConfigStore`] without external dependencies, for local
//! development, tests, and deployments that do not need durability. All state
//! is lost when the process exits.
//!
//! # Concurrency model
//! Two map-level `RwLock`s index namespaces and configs. They are held only
//! long enough to look up, insert, or remove an entry, never across the work
//! done on an entity. The entities carry their own locks:
//! - each config has a `Mutex` around its state; every read and write of that
//!   config goes through it, so writers to one config are serialized while
//!   writers to different configs proceed in parallel;
//! - each namespace has a gate `RwLock`. Config creation holds it shared and
//!   namespace deletion holds it exclusive, so the emptiness check cannot
//!   race a concurrent create.
//!
//! Lock order is namespace gate, then config map, then config entry. A config
//! delete holds its entry lock while it removes the map entry; nothing holds
//! a map lock while waiting on an entry lock.
use super::versioning::{check_deletable, plan_initial, plan_update};
use super::{
    ConfigListFilter, ConfigStore, ConfigUpdate, ConflictReason, NewConfig, StoreError,
    StoreResult,
};
use crate::browse::{BrowseRow, project};
use crate::cursor::{Page, PageRequest};
use crate::fingerprint::stored_or_rehash;
use crate::model::{
    BrowseEntry, Config, ConfigKey, ConfigListItem, ConfigVersion, ConfigVersionMeta,
    ConfigWithVersion, Namespace, NamespaceWithCount,
};
use crate::validate::{normalize_prefix, validate_namespace, validate_namespace_name};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

struct NamespaceEntry {
    namespace: Namespace,
    /// `true` once the namespace has been deleted.
    gate: RwLock<bool>,
}

struct ConfigEntry {
    state: Mutex<ConfigState>,
}

struct ConfigState {
    config: Config,
    versions: BTreeMap<u32, ConfigVersion>,
    /// Set under the entry lock before the entry leaves the map.
    deleted: bool,
}

impl ConfigState {
    fn latest(&self) -> Option<&ConfigVersion> {
        self.versions.values().next_back()
    }

    fn latest_number(&self) -> u32 {
        self.versions.keys().next_back().copied().unwrap_or(0)
    }

    fn with_version(&self, version: &ConfigVersion) -> ConfigWithVersion {
        ConfigWithVersion {
            config: self.config.clone(),
            version: version.clone(),
        }
    }
}

/// In-memory config store.
#[derive(Default)]
pub struct InMemoryStore {
    namespaces: RwLock<BTreeMap<String, Arc<NamespaceEntry>>>,
    configs: RwLock<BTreeMap<ConfigKey, Arc<ConfigEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn namespace_entry(&self, name: &str) -> Option<Arc<NamespaceEntry>> {
        self.namespaces.read().await.get(name).cloned()
    }

    async fn config_entry(&self, key: &ConfigKey) -> StoreResult<Arc<ConfigEntry>> {
        self.configs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("config".into()))
    }

    /// Entries matching `keep`, in key order. The map lock is released before
    /// any entry is locked.
    async fn config_entries<F>(&self, keep: F) -> Vec<(ConfigKey, Arc<ConfigEntry>)>
    where
        F: Fn(&ConfigKey) -> bool,
    {
        self.configs
            .read()
            .await
            .iter()
            .filter(|(key, _)| keep(key))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}

fn missing_config() -> StoreError {
    StoreError::NotFound("config".into())
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    async fn list_namespaces(&self, page: PageRequest) -> StoreResult<Page<NamespaceWithCount>> {
        let namespaces: Vec<Namespace> = self
            .namespaces
            .read()
            .await
            .values()
            .map(|entry| entry.namespace.clone())
            .collect();
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for key in self.configs.read().await.keys() {
            *counts.entry(key.namespace().to_string()).or_default() += 1;
        }
        let items = namespaces
            .into_iter()
            .map(|namespace| NamespaceWithCount {
                config_count: counts.get(&namespace.name).copied().unwrap_or(0),
                namespace,
            })
            .collect();
        Ok(page.slice(items))
    }

    async fn create_namespace(&self, name: &str) -> StoreResult<Namespace> {
        let name = validate_namespace_name(name)?;
        let mut namespaces = self.namespaces.write().await;
        if namespaces.contains_key(&name) {
            return Err(StoreError::Conflict(ConflictReason::AlreadyExists("namespace")));
        }
        let namespace = Namespace::new(name.clone());
        namespaces.insert(
            name,
            Arc::new(NamespaceEntry {
                namespace: namespace.clone(),
                gate: RwLock::new(false),
            }),
        );
        metrics::gauge!("configstore_namespaces_total").set(namespaces.len() as f64);
        Ok(namespace)
    }

    async fn delete_namespace(&self, name: &str) -> StoreResult<()> {
        let name = validate_namespace(name)?;
        let entry = self
            .namespace_entry(&name)
            .await
            .ok_or_else(|| StoreError::NotFound("namespace".into()))?;
        let mut deleted = entry.gate.write().await;
        if *deleted {
            return Err(StoreError::NotFound("namespace".into()));
        }
        let config_count = self
            .configs
            .read()
            .await
            .keys()
            .filter(|key| key.namespace() == name)
            .count() as i64;
        if config_count > 0 {
            return Err(StoreError::Conflict(ConflictReason::NamespaceNotEmpty {
                config_count,
            }));
        }
        *deleted = true;
        let mut namespaces = self.namespaces.write().await;
        namespaces.remove(&name);
        metrics::gauge!("configstore_namespaces_total").set(namespaces.len() as f64);
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.namespaces.read().await.contains_key(name.trim()))
    }

    async fn browse(
        &self,
        namespace: &str,
        prefix: &str,
        page: PageRequest,
    ) -> StoreResult<Page<BrowseEntry>> {
        let namespace = validate_namespace(namespace)?;
        let prefix = normalize_prefix(prefix)?;
        if !self.namespace_exists(&namespace).await? {
            return Err(StoreError::NotFound("namespace".into()));
        }
        let entries = self
            .config_entries(|key| key.namespace() == namespace && key.path().starts_with(&prefix))
            .await;
        let mut rows = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let state = entry.state.lock().await;
            if state.deleted {
                continue;
            }
            rows.push(BrowseRow {
                path: key.path().to_string(),
                format: state.config.format,
                latest_version: state.latest_number(),
            });
        }
        Ok(page.slice(project(&prefix, rows)))
    }

    async fn list_configs(
        &self,
        filter: &ConfigListFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ConfigListItem>> {
        let entries = self.config_entries(|key| filter.matches(key)).await;
        let mut items = Vec::with_capacity(entries.len());
        for (_, entry) in entries {
            let state = entry.state.lock().await;
            if state.deleted {
                continue;
            }
            if let Some(latest) = state.latest() {
                items.push(ConfigListItem {
                    config: state.config.clone(),
                    latest_meta: latest.meta(),
                });
            }
        }
        Ok(page.slice(items))
    }

    async fn create_config(&self, new: NewConfig) -> StoreResult<ConfigWithVersion> {
        let planned = plan_initial(new.format, &new.body_raw)?;
        let namespace = self
            .namespace_entry(new.key.namespace())
            .await
            .ok_or_else(|| StoreError::NotFound("namespace".into()))?;
        let gate = namespace.gate.read().await;
        if *gate {
            return Err(StoreError::NotFound("namespace".into()));
        }

        let mut configs = self.configs.write().await;
        if configs.contains_key(&new.key) {
            return Err(StoreError::Conflict(ConflictReason::AlreadyExists("config")));
        }
        let now = Utc::now();
        let config_id = Uuid::new_v4();
        let version = planned.into_version(
            config_id,
            new.body_raw,
            new.comment,
            new.created_by,
            new.audit,
        );
        let config = Config {
            id: config_id,
            namespace: new.key.namespace().to_string(),
            path: new.key.path().to_string(),
            format: new.format,
            latest_version_id: Some(version.id),
            created_at: now,
            updated_at: now,
        };
        let created = ConfigWithVersion {
            config: config.clone(),
            version: version.clone(),
        };
        let mut versions = BTreeMap::new();
        versions.insert(version.version, version);
        configs.insert(
            new.key,
            Arc::new(ConfigEntry {
                state: Mutex::new(ConfigState {
                    config,
                    versions,
                    deleted: false,
                }),
            }),
        );
        drop(configs);
        drop(gate);
        metrics::counter!("configstore_versions_created_total").increment(1);
        Ok(created)
    }

    async fn update_config(&self, update: ConfigUpdate) -> StoreResult<ConfigWithVersion> {
        let entry = self.config_entry(&update.key).await?;
        let mut state = entry.state.lock().await;
        if state.deleted {
            return Err(missing_config());
        }
        let current_latest = state.latest_number();
        let latest_fingerprint = state
            .latest()
            .map(|latest| stored_or_rehash(Some(&latest.content_sha256), &latest.body_raw));
        let planned = plan_update(
            current_latest,
            latest_fingerprint.as_deref(),
            state.config.format,
            &update,
        )?;
        let version = planned.into_version(
            state.config.id,
            update.body_raw,
            update.comment,
            update.created_by,
            update.audit,
        );
        state.config.latest_version_id = Some(version.id);
        state.config.updated_at = version.created_at;
        state.versions.insert(version.version, version.clone());
        metrics::counter!("configstore_versions_created_total").increment(1);
        Ok(ConfigWithVersion {
            config: state.config.clone(),
            version,
        })
    }

    async fn get_latest(&self, key: &ConfigKey) -> StoreResult<ConfigWithVersion> {
        let entry = self.config_entry(key).await?;
        let state = entry.state.lock().await;
        if state.deleted {
            return Err(missing_config());
        }
        let latest = state.latest().ok_or_else(missing_config)?;
        Ok(state.with_version(latest))
    }

    async fn get_version(&self, key: &ConfigKey, version: u32) -> StoreResult<ConfigWithVersion> {
        let entry = self.config_entry(key).await?;
        let state = entry.state.lock().await;
        if state.deleted {
            return Err(missing_config());
        }
        let found = state
            .versions
            .get(&version)
            .ok_or_else(|| StoreError::NotFound("version".into()))?;
        Ok(state.with_version(found))
    }

    async fn list_versions(
        &self,
        key: &ConfigKey,
        page: PageRequest,
    ) -> StoreResult<Page<ConfigVersionMeta>> {
        let entry = self.config_entry(key).await?;
        let state = entry.state.lock().await;
        if state.deleted {
            return Err(missing_config());
        }
        let metas: Vec<ConfigVersionMeta> =
            state.versions.values().rev().map(ConfigVersion::meta).collect();
        Ok(page.slice(metas))
    }

    async fn delete_version(&self, key: &ConfigKey, version: u32) -> StoreResult<()> {
        let entry = self.config_entry(key).await?;
        let mut state = entry.state.lock().await;
        if state.deleted {
            return Err(missing_config());
        }
        check_deletable(version, state.latest_number())?;
        state
            .versions
            .remove(&version)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("version".into()))
    }

    async fn delete_config(&self, key: &ConfigKey) -> StoreResult<()> {
        let entry = self.config_entry(key).await?;
        let mut state = entry.state.lock().await;
        if state.deleted {
            return Err(missing_config());
        }
        state.deleted = true;
        let mut configs = self.configs.write().await;
        if configs
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &entry))
        {
            configs.remove(key);
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // Always healthy while the process is running.
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
