//! Postgres-backed implementation of the config store.
//!
//! # Data model
//! Three tables (see `migrations/`): `namespaces`, `configs` keyed by
//! `(namespace, path)`, and `config_versions` keyed by `(config_id, version)`.
//! `configs.latest_version_id` points at the newest version row. Deleting a
//! config cascades to its versions; a namespace that still owns configs cannot
//! be deleted.
//!
//! # Consistency
//! Every mutation runs in one transaction. Writers to a config lock its row
//! with `FOR UPDATE` before reading the latest version, which serializes
//! version numbering per config. Config creation takes `FOR SHARE` on the
//! namespace row and namespace deletion takes `FOR UPDATE`, so a namespace
//! cannot be emptied-and-deleted while a create is in flight.
//!
//! # Operational notes
//! - Startup connects with bounded retry and exponential backoff, then runs
//!   the embedded migrations before any request is served.
//! - Reads that take more than one statement run in a `REPEATABLE READ, READ
//!   ONLY` transaction, so the config row and its versions come from one
//!   snapshot.
//! - `body_json` is stored as JSONB for ad-hoc querying, but responses rebuild
//!   the document from `body_raw` so mapping order matches the source text.
//! - The database URL may carry credentials and is never logged.
use super::versioning::{check_deletable, plan_initial, plan_update};
use super::{
    ConfigListFilter, ConfigStore, ConfigUpdate, ConflictReason, NewConfig, StoreError,
    StoreResult,
};
use crate::browse::{BrowseRow, project};
use crate::config::{DatabaseRetryConfig, PostgresConfig};
use crate::cursor::{Page, PageRequest};
use crate::document::{ConfigFormat, Document};
use crate::fingerprint::stored_or_rehash;
use crate::model::{
    BrowseEntry, Config, ConfigKey, ConfigListItem, ConfigVersion, ConfigVersionMeta,
    ConfigWithVersion, Namespace, NamespaceWithCount,
};
use crate::validate::{normalize_prefix, validate_namespace, validate_namespace_name};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Durable config store backed by Postgres.
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbNamespace {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    config_count: i64,
}

#[derive(Debug, Clone, FromRow)]
struct DbConfig {
    id: Uuid,
    namespace: String,
    path: String,
    format: String,
    latest_version_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbVersion {
    id: Uuid,
    config_id: Uuid,
    version: i32,
    body_raw: String,
    created_by: Option<String>,
    comment: Option<String>,
    content_sha256: Option<String>,
    created_at: DateTime<Utc>,
    request_id: Option<String>,
    user_agent: Option<String>,
    source_ip: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct DbVersionMeta {
    id: Uuid,
    version: i32,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
    comment: Option<String>,
    content_sha256: Option<String>,
}

/// A config row joined with its latest version metadata.
#[derive(Debug, Clone, FromRow)]
struct DbConfigListRow {
    #[sqlx(flatten)]
    config: DbConfig,
    version_id: Uuid,
    version: i32,
    version_created_at: DateTime<Utc>,
    created_by: Option<String>,
    comment: Option<String>,
    content_sha256: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct DbBrowseRow {
    path: String,
    format: String,
    latest_version: i32,
}

const CONFIG_COLUMNS: &str =
    "c.id, c.namespace, c.path, c.format, c.latest_version_id, c.created_at, c.updated_at";

const VERSION_COLUMNS: &str = "id, config_id, version, body_raw, created_by, comment, \
     content_sha256, created_at, request_id, user_agent, source_ip";

impl PostgresStore {
    /// Connect with retry, then apply migrations.
    ///
    /// Each failed attempt is logged and followed by a sleep that starts at
    /// `retry.initial_backoff_ms` and doubles. The last failure is returned.
    pub async fn connect(pg: &PostgresConfig, retry: &DatabaseRetryConfig) -> StoreResult<Self> {
        let max_attempts = retry.max_attempts.max(1);
        let mut backoff = retry.initial_backoff();
        let mut attempt = 1;
        let pool = loop {
            match open_pool(pg).await {
                Ok(pool) => break pool,
                Err(err) if attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "database connect attempt failed"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempt, max_attempts, error = %err, "database unreachable");
                    return Err(err);
                }
            }
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        let store = Self { pool };
        store.refresh_counts().await?;
        Ok(store)
    }

    async fn refresh_counts(&self) -> StoreResult<()> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM namespaces")
            .fetch_one(&self.pool)
            .await?;
        metrics::gauge!("configstore_namespaces_total").set(total as f64);
        Ok(())
    }

    /// Lock the config row for the rest of `tx`.
    async fn lock_config(
        tx: &mut Transaction<'static, Postgres>,
        key: &ConfigKey,
    ) -> StoreResult<DbConfig> {
        let query = format!(
            "SELECT {CONFIG_COLUMNS} FROM configs c WHERE c.namespace = $1 AND c.path = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, DbConfig>(&query)
            .bind(key.namespace())
            .bind(key.path())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(missing_config)
    }

    /// Open a read-only transaction whose statements all see one snapshot.
    async fn begin_snapshot(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn find_config(
        tx: &mut Transaction<'static, Postgres>,
        key: &ConfigKey,
    ) -> StoreResult<DbConfig> {
        let query =
            format!("SELECT {CONFIG_COLUMNS} FROM configs c WHERE c.namespace = $1 AND c.path = $2");
        sqlx::query_as::<_, DbConfig>(&query)
            .bind(key.namespace())
            .bind(key.path())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(missing_config)
    }

    async fn insert_version(
        tx: &mut Transaction<'static, Postgres>,
        version: &ConfigVersion,
    ) -> StoreResult<()> {
        let body_json = serde_json::to_value(&version.body_json)
            .map_err(|err| StoreError::Unexpected(err.into()))?;
        sqlx::query(
            r#"INSERT INTO config_versions
                   (id, config_id, version, body_raw, body_json, created_by, comment,
                    content_sha256, created_at, request_id, user_agent, source_ip)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(version.id)
        .bind(version.config_id)
        .bind(db_version(version.version)?)
        .bind(&version.body_raw)
        .bind(body_json)
        .bind(&version.created_by)
        .bind(&version.comment)
        .bind(&version.content_sha256)
        .bind(version.created_at)
        .bind(&version.request_id)
        .bind(&version.user_agent)
        .bind(&version.source_ip)
        .execute(&mut **tx)
        .await?;
        sqlx::query("UPDATE configs SET latest_version_id = $1, updated_at = $2 WHERE id = $3")
            .bind(version.id)
            .bind(version.created_at)
            .bind(version.config_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

async fn open_pool(pg: &PostgresConfig) -> StoreResult<PgPool> {
    let connect_options = PgConnectOptions::from_str(&pg.url)?;
    let connect = PgPoolOptions::new()
        .max_connections(pg.max_connections)
        .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
        .connect_with(connect_options);
    let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
        .await
        .map_err(|_| StoreError::Unavailable("database connect timed out".into()))??;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

fn missing_config() -> StoreError {
    StoreError::NotFound("config".into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_db_code(err, "23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_db_code(err, "23503")
}

fn has_db_code(err: &sqlx::Error, expected: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == expected).unwrap_or(false);
    }
    false
}

fn db_version(version: u32) -> StoreResult<i32> {
    i32::try_from(version)
        .map_err(|_| StoreError::Unexpected(anyhow!("version {version} exceeds storage range")))
}

fn api_version(version: i32) -> StoreResult<u32> {
    u32::try_from(version)
        .map_err(|_| StoreError::Unexpected(anyhow!("invalid stored version {version}")))
}

fn parse_format(value: &str) -> StoreResult<ConfigFormat> {
    ConfigFormat::from_str(value)
        .map_err(|_| StoreError::Unexpected(anyhow!("invalid stored format {value}")))
}

fn limit_offset(page: &PageRequest) -> (i64, i64) {
    (i64::from(page.limit), page.offset as i64)
}

fn config_from_db(row: DbConfig) -> StoreResult<Config> {
    Ok(Config {
        id: row.id,
        format: parse_format(&row.format)?,
        namespace: row.namespace,
        path: row.path,
        latest_version_id: row.latest_version_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn version_from_db(row: DbVersion, format: ConfigFormat) -> StoreResult<ConfigVersion> {
    let body_json = Document::parse(format, &row.body_raw)
        .map_err(|err| StoreError::Unexpected(anyhow!("stored body no longer parses: {err}")))?;
    Ok(ConfigVersion {
        id: row.id,
        config_id: row.config_id,
        version: api_version(row.version)?,
        content_sha256: stored_or_rehash(row.content_sha256.as_deref(), &row.body_raw),
        body_raw: row.body_raw,
        body_json,
        created_by: row.created_by,
        comment: row.comment,
        created_at: row.created_at,
        request_id: row.request_id,
        user_agent: row.user_agent,
        source_ip: row.source_ip,
    })
}

fn meta_from_db(row: DbVersionMeta) -> StoreResult<ConfigVersionMeta> {
    Ok(ConfigVersionMeta {
        id: row.id,
        version: api_version(row.version)?,
        created_at: row.created_at,
        created_by: row.created_by,
        comment: row.comment,
        content_sha256: row.content_sha256,
    })
}

fn list_item_from_db(row: DbConfigListRow) -> StoreResult<ConfigListItem> {
    Ok(ConfigListItem {
        latest_meta: meta_from_db(DbVersionMeta {
            id: row.version_id,
            version: row.version,
            created_at: row.version_created_at,
            created_by: row.created_by,
            comment: row.comment,
            content_sha256: row.content_sha256,
        })?,
        config: config_from_db(row.config)?,
    })
}

#[async_trait]
impl ConfigStore for PostgresStore {
    async fn list_namespaces(&self, page: PageRequest) -> StoreResult<Page<NamespaceWithCount>> {
        let (limit, offset) = limit_offset(&page);
        let rows = sqlx::query_as::<_, DbNamespace>(
            r#"SELECT n.id, n.name, n.created_at, n.updated_at, COUNT(c.id) AS config_count
               FROM namespaces n
               LEFT JOIN configs c ON c.namespace = n.name
               GROUP BY n.id
               ORDER BY n.name COLLATE "C"
               LIMIT $1 OFFSET $2"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let items = rows
            .into_iter()
            .map(|row| NamespaceWithCount {
                namespace: Namespace {
                    id: row.id,
                    name: row.name,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                config_count: row.config_count,
            })
            .collect();
        Ok(Page::new(items, &page))
    }

    async fn create_namespace(&self, name: &str) -> StoreResult<Namespace> {
        let namespace = Namespace::new(validate_namespace_name(name)?);
        let insert = sqlx::query(
            "INSERT INTO namespaces (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(namespace.id)
        .bind(&namespace.name)
        .bind(namespace.created_at)
        .bind(namespace.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict(ConflictReason::AlreadyExists("namespace")));
            }
            return Err(err.into());
        }
        self.refresh_counts().await?;
        Ok(namespace)
    }

    async fn delete_namespace(&self, name: &str) -> StoreResult<()> {
        let name = validate_namespace(name)?;
        let mut tx = self.pool.begin().await?;
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM namespaces WHERE name = $1 FOR UPDATE")
                .bind(&name)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("namespace".into()));
        }
        let config_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM configs WHERE namespace = $1")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;
        if config_count > 0 {
            return Err(StoreError::Conflict(ConflictReason::NamespaceNotEmpty {
                config_count,
            }));
        }
        let deleted = sqlx::query("DELETE FROM namespaces WHERE name = $1")
            .bind(&name)
            .execute(&mut *tx)
            .await;
        if let Err(err) = deleted {
            if is_foreign_key_violation(&err) {
                return Err(StoreError::Conflict(ConflictReason::NamespaceNotEmpty {
                    config_count: 1,
                }));
            }
            return Err(err.into());
        }
        tx.commit().await?;
        self.refresh_counts().await?;
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM namespaces WHERE name = $1)")
                .bind(name.trim())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn browse(
        &self,
        namespace: &str,
        prefix: &str,
        page: PageRequest,
    ) -> StoreResult<Page<BrowseEntry>> {
        let namespace = validate_namespace(namespace)?;
        let prefix = normalize_prefix(prefix)?;
        let mut tx = self.begin_snapshot().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM namespaces WHERE name = $1)")
                .bind(&namespace)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(StoreError::NotFound("namespace".into()));
        }
        let rows = sqlx::query_as::<_, DbBrowseRow>(
            r#"SELECT c.path, c.format, COALESCE(MAX(v.version), 0) AS latest_version
               FROM configs c
               LEFT JOIN config_versions v ON v.config_id = c.id
               WHERE c.namespace = $1 AND left(c.path, char_length($2)) = $2
               GROUP BY c.id"#,
        )
        .bind(&namespace)
        .bind(&prefix)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        let rows = rows
            .into_iter()
            .map(|row| {
                Ok(BrowseRow {
                    format: parse_format(&row.format)?,
                    latest_version: api_version(row.latest_version)?,
                    path: row.path,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(page.slice(project(&prefix, rows)))
    }

    async fn list_configs(
        &self,
        filter: &ConfigListFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ConfigListItem>> {
        let (limit, offset) = limit_offset(&page);
        let query = format!(
            r#"SELECT {CONFIG_COLUMNS},
                      v.id AS version_id, v.version, v.created_at AS version_created_at,
                      v.created_by, v.comment, v.content_sha256
               FROM configs c
               JOIN LATERAL (
                   SELECT id, version, created_at, created_by, comment, content_sha256
                   FROM config_versions
                   WHERE config_id = c.id
                   ORDER BY version DESC
                   LIMIT 1
               ) v ON TRUE
               WHERE ($1::text IS NULL OR c.namespace = $1)
                 AND left(c.path, char_length($2)) = $2
                 AND ($3 OR strpos(substr(c.path, char_length($2) + 1), '/') = 0)
               ORDER BY c.namespace COLLATE "C", c.path COLLATE "C"
               LIMIT $4 OFFSET $5"#
        );
        let rows = sqlx::query_as::<_, DbConfigListRow>(&query)
            .bind(filter.namespace())
            .bind(filter.prefix())
            .bind(filter.recursive())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(list_item_from_db)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, &page))
    }

    async fn create_config(&self, new: NewConfig) -> StoreResult<ConfigWithVersion> {
        let planned = plan_initial(new.format, &new.body_raw)?;
        let mut tx = self.pool.begin().await?;
        let namespace: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM namespaces WHERE name = $1 FOR SHARE")
                .bind(new.key.namespace())
                .fetch_optional(&mut *tx)
                .await?;
        if namespace.is_none() {
            return Err(StoreError::NotFound("namespace".into()));
        }

        let now = Utc::now();
        let mut config = Config {
            id: Uuid::new_v4(),
            namespace: new.key.namespace().to_string(),
            path: new.key.path().to_string(),
            format: new.format,
            latest_version_id: None,
            created_at: now,
            updated_at: now,
        };
        let insert = sqlx::query(
            r#"INSERT INTO configs (id, namespace, path, format, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(config.id)
        .bind(&config.namespace)
        .bind(&config.path)
        .bind(config.format.as_str())
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&mut *tx)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict(ConflictReason::AlreadyExists("config")));
            }
            if is_foreign_key_violation(&err) {
                return Err(StoreError::NotFound("namespace".into()));
            }
            return Err(err.into());
        }

        let version = planned.into_version(
            config.id,
            new.body_raw,
            new.comment,
            new.created_by,
            new.audit,
        );
        Self::insert_version(&mut tx, &version).await?;
        tx.commit().await?;

        config.latest_version_id = Some(version.id);
        config.updated_at = version.created_at;
        metrics::counter!("configstore_versions_created_total").increment(1);
        Ok(ConfigWithVersion { config, version })
    }

    async fn update_config(&self, update: ConfigUpdate) -> StoreResult<ConfigWithVersion> {
        let mut tx = self.pool.begin().await?;
        let row = Self::lock_config(&mut tx, &update.key).await?;
        let mut config = config_from_db(row)?;
        let latest = sqlx::query_as::<_, (i32, String, Option<String>)>(
            r#"SELECT version, body_raw, content_sha256
               FROM config_versions
               WHERE config_id = $1
               ORDER BY version DESC
               LIMIT 1"#,
        )
        .bind(config.id)
        .fetch_optional(&mut *tx)
        .await?;
        let (current_latest, latest_fingerprint) = match latest {
            Some((version, body_raw, stored)) => (
                api_version(version)?,
                Some(stored_or_rehash(stored.as_deref(), &body_raw)),
            ),
            None => (0, None),
        };
        let planned = plan_update(
            current_latest,
            latest_fingerprint.as_deref(),
            config.format,
            &update,
        )?;
        let version = planned.into_version(
            config.id,
            update.body_raw,
            update.comment,
            update.created_by,
            update.audit,
        );
        Self::insert_version(&mut tx, &version).await?;
        tx.commit().await?;

        config.latest_version_id = Some(version.id);
        config.updated_at = version.created_at;
        metrics::counter!("configstore_versions_created_total").increment(1);
        Ok(ConfigWithVersion { config, version })
    }

    async fn get_latest(&self, key: &ConfigKey) -> StoreResult<ConfigWithVersion> {
        let mut tx = self.begin_snapshot().await?;
        let config = config_from_db(Self::find_config(&mut tx, key).await?)?;
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM config_versions WHERE config_id = $1 ORDER BY version DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, DbVersion>(&query)
            .bind(config.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(missing_config)?;
        tx.commit().await?;
        let version = version_from_db(row, config.format)?;
        Ok(ConfigWithVersion { config, version })
    }

    async fn get_version(&self, key: &ConfigKey, version: u32) -> StoreResult<ConfigWithVersion> {
        let mut tx = self.begin_snapshot().await?;
        let config = config_from_db(Self::find_config(&mut tx, key).await?)?;
        let Ok(number) = i32::try_from(version) else {
            return Err(StoreError::NotFound("version".into()));
        };
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM config_versions WHERE config_id = $1 AND version = $2"
        );
        let row = sqlx::query_as::<_, DbVersion>(&query)
            .bind(config.id)
            .bind(number)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound("version".into()))?;
        tx.commit().await?;
        let version = version_from_db(row, config.format)?;
        Ok(ConfigWithVersion { config, version })
    }

    async fn list_versions(
        &self,
        key: &ConfigKey,
        page: PageRequest,
    ) -> StoreResult<Page<ConfigVersionMeta>> {
        let mut tx = self.begin_snapshot().await?;
        let config = Self::find_config(&mut tx, key).await?;
        let (limit, offset) = limit_offset(&page);
        let rows = sqlx::query_as::<_, DbVersionMeta>(
            r#"SELECT id, version, created_at, created_by, comment, content_sha256
               FROM config_versions
               WHERE config_id = $1
               ORDER BY version DESC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(config.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        let items = rows
            .into_iter()
            .map(meta_from_db)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, &page))
    }

    async fn delete_version(&self, key: &ConfigKey, version: u32) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let config = Self::lock_config(&mut tx, key).await?;
        let latest: Option<i32> =
            sqlx::query_scalar("SELECT MAX(version) FROM config_versions WHERE config_id = $1")
                .bind(config.id)
                .fetch_one(&mut *tx)
                .await?;
        let latest = latest.map(api_version).transpose()?.unwrap_or(0);
        check_deletable(version, latest)?;
        let Ok(number) = i32::try_from(version) else {
            return Err(StoreError::NotFound("version".into()));
        };
        let deleted = sqlx::query("DELETE FROM config_versions WHERE config_id = $1 AND version = $2")
            .bind(config.id)
            .bind(number)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound("version".into()));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_config(&self, key: &ConfigKey) -> StoreResult<()> {
        let deleted = sqlx::query("DELETE FROM configs WHERE namespace = $1 AND path = $2")
            .bind(key.namespace())
            .bind(key.path())
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(missing_config());
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
