//! Core domain logic for the taskbox record service.
//! This crate is the single source of truth for storage/cache consistency
//! rules; adapter layers (HTTP, config) stay thin on top of it.

pub mod cache;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::task_cache::TaskCache;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{TaskDraft, TaskId, TaskPatch, TaskRecord, TaskValidationError};
pub use repo::file_repo::JsonFileTaskRepository;
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::task_service::TaskService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
