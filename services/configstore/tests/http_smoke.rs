mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{memory_app, read_json};
use configstore::app::{AppState, build_router};
use configstore::config::ServerConfig;
use configstore::cursor::{Page, PageRequest};
use configstore::model::{
    BrowseEntry, ConfigKey, ConfigListItem, ConfigVersionMeta, ConfigWithVersion, Namespace,
    NamespaceWithCount,
};
use configstore::store::{
    ConfigListFilter, ConfigStore, ConfigUpdate, NewConfig, StoreError, StoreResult,
};
use http_helpers::{empty_request, json_request, raw_request};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

type App = axum::routing::RouterIntoService<Body, ()>;

async fn send(app: &App, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::METHOD_NOT_ALLOWED {
        return (status, serde_json::Value::Null);
    }
    (status, read_json(response).await)
}

async fn create_namespace(app: &App, name: &str) {
    let (status, _) = send(app, json_request("POST", "/namespaces", json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn create_config(app: &App, uri: &str, format: &str, body_raw: &str) -> serde_json::Value {
    let (status, body) = send(
        app,
        json_request("POST", uri, json!({ "format": format, "body_raw": body_raw })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn health_and_readiness() {
    let app = memory_app();
    let (status, body) = send(&app, empty_request("GET", "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, body) = send(&app, empty_request("GET", "/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = memory_app();
    let (status, body) = send(&app, empty_request("GET", "/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "configstore");
    assert!(body["paths"]["/configs/{namespace}/{path}"].is_object());
}

#[tokio::test]
async fn request_id_is_generated_or_echoed() {
    let app = memory_app();
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/healthz"))
        .await
        .expect("response");
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/healthz")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );
}

#[tokio::test]
async fn config_lifecycle_end_to_end() {
    let app = memory_app();
    create_namespace(&app, "team").await;

    let created = create_config(&app, "/configs/team/svc.yaml", "yaml", "a: 1").await;
    assert_eq!(created["config"]["namespace"], "team");
    assert_eq!(created["config"]["path"], "svc.yaml");
    assert_eq!(created["config"]["format"], "yaml");
    assert_eq!(created["latest"]["version"], 1);
    assert_eq!(created["latest"]["body_json"], json!({ "a": 1 }));
    assert_eq!(created["latest"]["content_sha256"].as_str().map(str::len), Some(64));
    let first_version_id = created["latest"]["id"].clone();

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            "/configs/team/svc.yaml",
            json!({ "body_raw": "a: 2", "base_version": 1, "comment": "bump" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["latest"]["version"], 2);
    assert_eq!(updated["latest"]["comment"], "bump");
    assert_eq!(updated["config"]["latest_version_id"], updated["latest"]["id"]);
    assert_ne!(updated["latest"]["id"], first_version_id);

    let (status, latest) = send(&app, empty_request("GET", "/configs/team/svc.yaml")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["latest"]["version"], 2);
    assert_eq!(latest["latest"]["body_json"], json!({ "a": 2 }));

    let (status, v1) = send(&app, empty_request("GET", "/configs/team/svc.yaml/versions/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v1["version"]["version"], 1);
    assert_eq!(v1["version"]["body_raw"], "a: 1");

    let (status, versions) =
        send(&app, empty_request("GET", "/configs/team/svc.yaml/versions")).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<u64> = versions["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|item| item["version"].as_u64())
        .collect();
    assert_eq!(numbers, vec![2, 1]);
    assert!(versions["items"][0].get("body_raw").is_none());

    let (status, body) = send(
        &app,
        empty_request("DELETE", "/configs/team/svc.yaml/versions/2"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert_eq!(body["details"]["reason"], "latest_version");

    let (status, _) = send(
        &app,
        empty_request("DELETE", "/configs/team/svc.yaml/versions/1"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) =
        send(&app, empty_request("GET", "/configs/team/svc.yaml/versions/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, latest) = send(&app, empty_request("GET", "/configs/team/svc.yaml")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["latest"]["version"], 2);
}

#[tokio::test]
async fn update_conflicts_report_reason() {
    let app = memory_app();
    create_namespace(&app, "team").await;
    create_config(&app, "/configs/team/app.json", "json", r#"{"x":1}"#).await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/configs/team/app.json", json!({ "body_raw": r#"{"x":1}"# })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "no_change");
    assert_eq!(body["details"]["current_version"], 1);
    assert!(body["request_id"].is_string());

    let (status, _) = send(
        &app,
        json_request("PUT", "/configs/team/app.json", json!({ "body_raw": r#"{"x":2}"# })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/configs/team/app.json",
            json!({ "body_raw": r#"{"x":3}"#, "base_version": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "version_mismatch");
    assert_eq!(body["details"]["base_version"], 1);
    assert_eq!(body["details"]["current_version"], 2);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/configs/team/app.json",
            json!({ "format": "json", "body_raw": "{}" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "already_exists");
}

#[tokio::test]
async fn create_config_validates_input() {
    let app = memory_app();
    let (status, body) = send(
        &app,
        json_request("POST", "/configs/ghost/a.json", json!({ "format": "json", "body_raw": "{}" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "namespace not found");

    create_namespace(&app, "team").await;
    let (status, body) = send(
        &app,
        json_request("POST", "/configs/team/a.toml", json!({ "format": "toml", "body_raw": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
    assert_eq!(body["details"]["field"], "format");

    let (status, body) = send(
        &app,
        json_request("POST", "/configs/team/a.json", json!({ "format": "json", "body_raw": "{" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/configs/team/a/../b.json",
            json!({ "format": "json", "body_raw": "{}" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "path");

    let (status, body) = send(&app, raw_request("POST", "/configs/team/a.json", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid json body");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/configs/team/a.json",
            json!({ "format": "json", "body_raw": "{}", "extra": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid json body");

    let (status, body) = send(
        &app,
        raw_request(
            "POST",
            "/configs/team/a.json",
            r#"{"format":"json","body_raw":"{}"} {}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid json body");
}

#[tokio::test]
async fn version_endpoints_reject_bad_numbers_and_writes() {
    let app = memory_app();
    create_namespace(&app, "team").await;
    create_config(&app, "/configs/team/svc.yaml", "yaml", "a: 1").await;

    let (status, body) =
        send(&app, empty_request("GET", "/configs/team/svc.yaml/versions/zero")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "version");

    let (status, _) = send(
        &app,
        json_request("PUT", "/configs/team/svc.yaml/versions", json!({ "body_raw": "a: 3" })),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, empty_request("DELETE", "/configs/team/svc.yaml/versions")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) =
        send(&app, empty_request("GET", "/configs/team/missing.yaml/versions")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "config not found");
}

#[tokio::test]
async fn namespaces_crud_and_counts() {
    let app = memory_app();
    create_namespace(&app, "beta").await;
    create_namespace(&app, "alpha").await;

    let (status, body) = send(&app, json_request("POST", "/namespaces", json!({ "name": "alpha" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "already_exists");
    assert_eq!(body["details"]["kind"], "namespace");

    let (status, body) =
        send(&app, json_request("POST", "/namespaces", json!({ "name": "bad name" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "name");

    create_config(&app, "/configs/beta/one.json", "json", "{}").await;

    let (status, body) = send(&app, empty_request("GET", "/namespaces")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().expect("items");
    let names: Vec<&str> = items.iter().filter_map(|ns| ns["name"].as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(items[0]["config_count"], 0);
    assert_eq!(items[1]["config_count"], 1);
    assert!(body.get("next_cursor").is_none());

    let (status, body) = send(&app, empty_request("DELETE", "/namespaces/beta")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["reason"], "namespace_not_empty");
    assert_eq!(body["details"]["config_count"], 1);

    let (status, _) = send(&app, empty_request("DELETE", "/configs/beta/one.json")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, empty_request("DELETE", "/namespaces/beta")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, empty_request("DELETE", "/namespaces/beta")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn namespace_pages_follow_cursor() {
    let app = memory_app();
    for name in ["a", "b", "c"] {
        create_namespace(&app, name).await;
    }
    let (status, first) = send(&app, empty_request("GET", "/namespaces?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["items"].as_array().map(Vec::len), Some(2));
    let cursor = first["next_cursor"].as_str().expect("cursor").to_string();

    let (status, second) =
        send(&app, empty_request("GET", &format!("/namespaces?limit=2&cursor={cursor}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["items"][0]["name"], "c");
    assert!(second.get("next_cursor").is_none());

    for query in ["limit=0", "limit=501", "limit=ten"] {
        let (status, body) =
            send(&app, empty_request("GET", &format!("/namespaces?{query}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["details"]["field"], "limit");
    }
    let (status, body) = send(&app, empty_request("GET", "/namespaces?cursor=%21%21")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "cursor");
}

#[tokio::test]
async fn browse_lists_one_folder_level() {
    let app = memory_app();
    create_namespace(&app, "team").await;
    create_config(&app, "/configs/team/svc/api.yaml", "yaml", "a: 1").await;
    create_config(&app, "/configs/team/svc/db/main.json", "json", "{}").await;
    create_config(&app, "/configs/team/root.json", "json", "{}").await;

    let (status, root) = send(&app, empty_request("GET", "/namespaces/team/browse")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        root["items"],
        json!([
            { "type": "config", "name": "root.json", "full_path": "root.json", "format": "json", "latest_version": 1 },
            { "type": "folder", "name": "svc", "full_path": "svc/" }
        ])
    );

    let (status, svc) =
        send(&app, empty_request("GET", "/namespaces/team/browse?prefix=svc")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = svc["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|entry| entry["name"].as_str())
        .collect();
    assert_eq!(names, vec!["api.yaml", "db"]);

    let (status, _) = send(&app, empty_request("GET", "/namespaces/ghost/browse")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_configs_filters_by_namespace_and_prefix() {
    let app = memory_app();
    create_namespace(&app, "team").await;
    create_namespace(&app, "other").await;
    create_config(&app, "/configs/team/svc/api.yaml", "yaml", "a: 1").await;
    create_config(&app, "/configs/team/svc/db/main.json", "json", "{}").await;
    create_config(&app, "/configs/other/svc/api.yaml", "yaml", "b: 2").await;

    let (status, all) = send(&app, empty_request("GET", "/configs")).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<String> = all["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| format!("{}/{}", item["config"]["namespace"].as_str().unwrap_or_default(), item["config"]["path"].as_str().unwrap_or_default()))
        .collect();
    assert_eq!(keys, vec!["other/svc/api.yaml", "team/svc/api.yaml", "team/svc/db/main.json"]);
    assert_eq!(all["items"][0]["latest_meta"]["version"], 1);

    let (status, flat) = send(
        &app,
        empty_request("GET", "/configs?namespace=team&prefix=svc&recursive=false"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flat["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(flat["items"][0]["config"]["path"], "svc/api.yaml");

    let (status, body) = send(&app, empty_request("GET", "/configs?recursive=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "recursive");
}

#[tokio::test]
async fn audit_headers_are_recorded_on_versions() {
    let app = memory_app();
    create_namespace(&app, "team").await;
    let request = Request::builder()
        .method("POST")
        .uri("/configs/team/audited.json")
        .header("content-type", "application/json")
        .header("x-request-id", "req-audit")
        .header("user-agent", "deploy-bot/1.0")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(
            json!({ "format": "json", "body_raw": "{}", "created_by": "ops" }).to_string(),
        ))
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["latest"]["request_id"], "req-audit");
    assert_eq!(body["latest"]["user_agent"], "deploy-bot/1.0");
    assert_eq!(body["latest"]["source_ip"], "203.0.113.7");
    assert_eq!(body["latest"]["created_by"], "ops");
}

struct UnavailableStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl ConfigStore for UnavailableStore {
    async fn list_namespaces(&self, _page: PageRequest) -> StoreResult<Page<NamespaceWithCount>> {
        down()
    }
    async fn create_namespace(&self, _name: &str) -> StoreResult<Namespace> {
        down()
    }
    async fn delete_namespace(&self, _name: &str) -> StoreResult<()> {
        down()
    }
    async fn namespace_exists(&self, _name: &str) -> StoreResult<bool> {
        down()
    }
    async fn browse(
        &self,
        _namespace: &str,
        _prefix: &str,
        _page: PageRequest,
    ) -> StoreResult<Page<BrowseEntry>> {
        down()
    }
    async fn list_configs(
        &self,
        _filter: &ConfigListFilter,
        _page: PageRequest,
    ) -> StoreResult<Page<ConfigListItem>> {
        down()
    }
    async fn create_config(&self, _new: NewConfig) -> StoreResult<ConfigWithVersion> {
        down()
    }
    async fn update_config(&self, _update: ConfigUpdate) -> StoreResult<ConfigWithVersion> {
        down()
    }
    async fn get_latest(&self, _key: &ConfigKey) -> StoreResult<ConfigWithVersion> {
        down()
    }
    async fn get_version(&self, _key: &ConfigKey, _version: u32) -> StoreResult<ConfigWithVersion> {
        down()
    }
    async fn list_versions(
        &self,
        _key: &ConfigKey,
        _page: PageRequest,
    ) -> StoreResult<Page<ConfigVersionMeta>> {
        down()
    }
    async fn delete_version(&self, _key: &ConfigKey, _version: u32) -> StoreResult<()> {
        down()
    }
    async fn delete_config(&self, _key: &ConfigKey) -> StoreResult<()> {
        down()
    }
    async fn health_check(&self) -> StoreResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
    fn is_durable(&self) -> bool {
        true
    }
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

#[tokio::test]
async fn unavailable_storage_maps_to_503() {
    let server = ServerConfig {
        readiness_timeout_ms: 50,
        ..ServerConfig::default()
    };
    let app = build_router(AppState::new(Arc::new(UnavailableStore), &server)).into_service();

    let (status, body) = send(&app, empty_request("GET", "/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "unavailable");
    assert_eq!(body["message"], "database not reachable");

    let (status, body) = send(&app, empty_request("GET", "/namespaces")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "storage unavailable");

    let (status, body) = send(&app, empty_request("GET", "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn oversized_bodies_get_json_errors() {
    let app = memory_app();
    let name = "n".repeat(2 * 1024 * 1024);
    let (status, body) = send(&app, json_request("POST", "/namespaces", json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
    assert_eq!(body["message"], "invalid json body");

    let server = ServerConfig {
        max_body_bytes: 256,
        ..ServerConfig::default()
    };
    let small = build_router(AppState::new(
        Arc::new(configstore::store::memory::InMemoryStore::new()),
        &server,
    ))
    .into_service();
    create_namespace(&small, "team").await;
    let body_raw = format!("{{\"pad\":\"{}\"}}", "x".repeat(512));
    for method in ["POST", "PUT"] {
        let (status, body) = send(
            &small,
            json_request(
                method,
                "/configs/team/big.json",
                json!({ "format": "json", "body_raw": body_raw }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(body["code"], "invalid_input");
        assert_eq!(body["message"], "invalid json body");
    }
}
