//! HTTP API service for the task list.
//!
//! Stateless CRUD handlers over the `todos` table plus a health probe,
//! served by axum.

pub mod config;
pub mod store;
pub mod web;

use std::future::Future;

use anyhow::Context;
use log::{info, warn};
use tokio::net::TcpListener;

pub use config::{Configuration, DatabaseLocation};
pub use store::{Store, StoreHealth};
pub use web::{build_router, AppState};

/// Starts the server and blocks until Ctrl-C.
///
/// Schema bootstrap runs eagerly here; an unreachable store is logged and
/// retried by the first data-touching request.
pub async fn run_server(config: Configuration) -> anyhow::Result<()> {
    info!(
        "event=server_start module=api status=start version={} addr={} database={}",
        todo_core::core_version(),
        config.listen_addr(),
        config.database.describe()
    );

    let store = Store::new(config.database.clone());
    store.bootstrap();

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    serve_until(listener, AppState::new(store), shutdown_signal()).await?;
    info!("event=server_stop module=api status=ok");
    Ok(())
}

/// Serves the router on an already bound listener until `shutdown` resolves.
pub async fn serve_until(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("event=server_listen module=api status=ok addr={addr}");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=api status=error error={err}");
        std::future::pending::<()>().await;
    }
}
