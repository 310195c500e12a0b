//! Server entry point: configuration, logging, backend wiring, serve loop.

use anyhow::Context;
use log::info;
use std::sync::Arc;
use taskbox_core::db::{open_db, open_db_in_memory};
use taskbox_core::{
    init_logging, JsonFileTaskRepository, SqliteTaskRepository, TaskRepository, TaskService,
};
use taskbox_server::config::{ServerConfig, StorageBackend};
use taskbox_server::routes::build_router;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().map_err(anyhow::Error::msg)?;
    init_logging(&config.log_level, config.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let repo = build_repository(&config.backend)?;
    let service = Arc::new(TaskService::new(repo));
    let app = build_router(service);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        "event=server_start module=server status=ok addr={} backend={:?} core_version={}",
        config.bind_addr,
        config.backend,
        taskbox_core::core_version()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated abnormally")?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

fn build_repository(
    backend: &StorageBackend,
) -> anyhow::Result<Box<dyn TaskRepository + Send + Sync>> {
    match backend {
        StorageBackend::Sqlite(path) => {
            let conn = open_db(path)
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            Ok(Box::new(SqliteTaskRepository::try_new(conn)?))
        }
        StorageBackend::SqliteMemory => {
            let conn = open_db_in_memory().context("failed to open in-memory database")?;
            Ok(Box::new(SqliteTaskRepository::try_new(conn)?))
        }
        StorageBackend::JsonFile(path) => Ok(Box::new(JsonFileTaskRepository::new(path))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("event=shutdown_signal module=server status=error error={err}");
    }
}
