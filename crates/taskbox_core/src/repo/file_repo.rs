//! JSON flat-file task store.
//!
//! # Responsibility
//! - Persist all records in one JSON document for deployments without a
//!   relational database.
//! - Assign identifiers from a persisted high-water mark.
//!
//! # Invariants
//! - `next_id` only grows, so identifiers survive restarts and are never
//!   reused after deletion.
//! - Every read-modify-write cycle runs under one lock; concurrent callers
//!   never interleave partial document states.
//! - Documents are replaced via temp-file rename, never written in place.

use crate::model::task::{now_epoch_ms, TaskDraft, TaskId, TaskRecord};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Errors raised by the flat-file backend.
#[derive(Debug)]
pub enum FileStoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for FileStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FileStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for FileStoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for FileStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<FileStoreError> for RepoError {
    fn from(value: FileStoreError) -> Self {
        Self::File(value)
    }
}

/// On-disk document shape.
#[derive(Debug, Serialize, Deserialize)]
struct FileDocument {
    /// Next identifier to assign. Persisted so deleting the highest record
    /// cannot cause its id to be handed out again.
    next_id: TaskId,
    tasks: Vec<TaskRecord>,
}

impl Default for FileDocument {
    fn default() -> Self {
        Self {
            next_id: 1,
            tasks: Vec::new(),
        }
    }
}

/// Flat-file task store backed by a single JSON document.
pub struct JsonFileTaskRepository {
    path: PathBuf,
    // Guards the whole load/mutate/save cycle.
    io_lock: Mutex<()>,
}

impl JsonFileTaskRepository {
    /// Creates a store rooted at `path`. The parent directory is created on
    /// demand; a missing document reads as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.io_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_document(&self) -> RepoResult<FileDocument> {
        if !self.path.exists() {
            return Ok(FileDocument::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(FileStoreError::from)?;
        let mut document: FileDocument =
            serde_json::from_str(&raw).map_err(FileStoreError::from)?;

        for record in &document.tasks {
            record.validate()?;
        }

        // Reconcile against hand-edited documents where the counter lags
        // behind existing ids.
        let max_id = document.tasks.iter().map(|record| record.id).max();
        if let Some(max_id) = max_id {
            if document.next_id <= max_id {
                warn!(
                    "event=file_store_reconcile module=repo status=ok next_id={} max_id={max_id}",
                    document.next_id
                );
                document.next_id = max_id + 1;
            }
        }

        Ok(document)
    }

    fn save_document(&self, document: &FileDocument) -> RepoResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(FileStoreError::from)?;
            }
        }

        let raw = serde_json::to_string_pretty(document).map_err(FileStoreError::from)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, raw).map_err(FileStoreError::from)?;
        fs::rename(&tmp_path, &self.path).map_err(FileStoreError::from)?;
        Ok(())
    }
}

impl TaskRepository for JsonFileTaskRepository {
    fn load_all(&self) -> RepoResult<Vec<TaskRecord>> {
        let _guard = self.lock();
        let mut document = self.load_document()?;
        document
            .tasks
            .sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(document.tasks)
    }

    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        draft.validate()?;

        let _guard = self.lock();
        let mut document = self.load_document()?;

        let created_at = now_epoch_ms();
        let record = TaskRecord {
            id: document.next_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            completed: draft.completed,
            created_at,
            completed_at: draft.completed.then_some(created_at),
        };

        document.next_id += 1;
        document.tasks.push(record.clone());
        self.save_document(&document)?;

        Ok(record)
    }

    fn update(&self, record: &TaskRecord) -> RepoResult<()> {
        record.validate()?;

        let _guard = self.lock();
        let mut document = self.load_document()?;

        let slot = document
            .tasks
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or(RepoError::NotFound(record.id))?;
        // The creation timestamp is immutable; keep the stored one.
        let created_at = slot.created_at;
        *slot = record.clone();
        slot.created_at = created_at;

        self.save_document(&document)
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        let _guard = self.lock();
        let mut document = self.load_document()?;

        let before = document.tasks.len();
        document.tasks.retain(|record| record.id != id);
        if document.tasks.len() == before {
            return Ok(false);
        }

        self.save_document(&document)?;
        Ok(true)
    }
}
