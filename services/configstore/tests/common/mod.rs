use axum::body::Body;
use axum::routing::RouterIntoService;
use configstore::app::{AppState, build_router};
use configstore::config::ServerConfig;
use configstore::store::memory::InMemoryStore;
use std::sync::Arc;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn memory_app() -> RouterIntoService<Body> {
    let state = AppState::new(Arc::new(InMemoryStore::new()), &ServerConfig::default());
    build_router(state).into_service()
}
