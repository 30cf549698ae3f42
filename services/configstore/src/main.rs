//! configstore HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, and the HTTP routers, then serves the API
//! and the metrics endpoint until a shutdown signal arrives.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use configstore::app::{AppState, build_router};
use configstore::config::{ServiceConfig, StorageBackend};
use configstore::observability;
use configstore::store::ConfigStore;
use configstore::store::memory::InMemoryStore;
use configstore::store::postgres::PostgresStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env_or_yaml().context("load configstore config")?;
    run_with_shutdown(config, shutdown_signal()).await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

async fn run_with_shutdown<F>(config: ServiceConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("configstore")?;
    let state = build_state(&config).await?;
    tracing::info!(
        backend = state.store.backend_name(),
        durable = state.store.is_durable(),
        "storage ready"
    );

    let (metrics_stop, metrics_stopped) = oneshot::channel::<()>();
    let metrics_addr = config.metrics_bind;
    let metrics_task = tokio::spawn(async move {
        tracing::info!(addr = %metrics_addr, "metrics listening");
        if let Err(err) = observability::serve_metrics_with_shutdown(
            metrics_handle,
            metrics_addr,
            async move {
                let _ = metrics_stopped.await;
            },
        )
        .await
        {
            tracing::warn!(error = %err, "metrics listener failed");
        }
    });

    let app = build_router(state);
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "configstore listening");
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    let _ = metrics_stop.send(());
    let _ = metrics_task.await;
    served.context("serve configstore api")?;
    tracing::info!("configstore stopped");
    Ok(())
}

async fn build_state(config: &ServiceConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn ConfigStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg, &config.database_retry)
                    .await
                    .context("connect postgres")?,
            )
        }
    };
    Ok(AppState::new(store, &config.server))
}
