//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve bind address, storage backend and logging settings from
//!   `TASKBOX_*` environment variables with sensible defaults.
//!
//! # Invariants
//! - Unknown backend names and malformed addresses are rejected at startup,
//!   never deferred to the first request.

use std::net::SocketAddr;
use std::path::PathBuf;
use taskbox_core::default_log_level;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB_PATH: &str = "taskbox.db";
const DEFAULT_DATA_PATH: &str = "taskbox-data.json";

/// Which persistent store the server runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite database file (the default).
    Sqlite(PathBuf),
    /// In-memory SQLite, for local experiments; data dies with the process.
    SqliteMemory,
    /// Single JSON document on disk.
    JsonFile(PathBuf),
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub backend: StorageBackend,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let bind_addr = var("TASKBOX_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|err| format!("invalid TASKBOX_ADDR `{bind_addr}`: {err}"))?;

        let backend_name = var("TASKBOX_STORAGE").unwrap_or_else(|| "sqlite".to_string());
        let backend = match backend_name.trim().to_ascii_lowercase().as_str() {
            "sqlite" => StorageBackend::Sqlite(PathBuf::from(
                var("TASKBOX_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            )),
            "sqlite-memory" => StorageBackend::SqliteMemory,
            "json" => StorageBackend::JsonFile(PathBuf::from(
                var("TASKBOX_DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
            )),
            other => {
                return Err(format!(
                    "unsupported TASKBOX_STORAGE `{other}`; expected sqlite|sqlite-memory|json"
                ));
            }
        };

        Ok(Self {
            bind_addr,
            backend,
            log_level: var("TASKBOX_LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            log_dir: var("TASKBOX_LOG_DIR").map(PathBuf::from),
        })
    }
}
