//! Cache/store coordinator for task records.
//!
//! # Responsibility
//! - Mediate every read and write between callers, the record cache and the
//!   persistent store.
//! - Enforce cache-aside reads and invalidate-then-repopulate writes.
//!
//! # Invariants
//! - The store is the source of truth; the cache is best-effort and only
//!   ever absent, never observably wrong about content.
//! - Updates merge against the authoritative store copy, never against a
//!   cache entry that may derive from a stale snapshot.
//! - The per-id cache is populated only after a store write committed.
//!
//! # Accepted race
//! A write's invalidation may interleave with a concurrent read's
//! repopulation, so a read that started before a write commits can re-cache
//! a snapshot that is one write stale. Every write still commits to the
//! store, and the next invalidation clears the snapshot, so staleness is
//! bounded and content is never corrupted. The same applies to a process
//! crash between store commit and cache repopulation. This is the
//! documented cache contract, not a defect to fix here.

use crate::cache::task_cache::TaskCache;
use crate::model::task::{now_epoch_ms, TaskDraft, TaskId, TaskPatch, TaskRecord};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use log::debug;

/// Coordinator owning one store handle and one cache instance.
///
/// Constructed per deployment (not process-global) so tests can build
/// isolated service/cache/store triples.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    cache: TaskCache,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a coordinator with a cold cache over the given store.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            cache: TaskCache::new(),
        }
    }

    /// Returns all records, newest first.
    ///
    /// Serves the cached snapshot when present; otherwise loads from the
    /// store and populates the snapshot. Ordering comes from the store
    /// contract, never re-derived here.
    pub fn list_all(&self) -> RepoResult<Vec<TaskRecord>> {
        if let Some(records) = self.cache.get_all() {
            debug!(
                "event=task_list module=service status=ok source=cache count={}",
                records.len()
            );
            return Ok(records);
        }

        let records = self.repo.load_all()?;
        self.cache.put_all(records.clone());
        debug!(
            "event=task_list module=service status=ok source=store count={}",
            records.len()
        );
        Ok(records)
    }

    /// Returns one record by id, or `None` when absent.
    ///
    /// Lookup order: per-id cache entry, then a scan of the cached snapshot
    /// (priming the per-id entry on a hit), then a full store load. A held
    /// snapshot answers negatively without a store round-trip; the snapshot
    /// is whole-collection, so an id it lacks is absent up to the accepted
    /// staleness bound.
    pub fn get_one(&self, id: TaskId) -> RepoResult<Option<TaskRecord>> {
        if let Some(record) = self.cache.get_by_id(id) {
            debug!("event=task_get module=service status=ok source=cache id={id}");
            return Ok(Some(record));
        }

        if let Some(snapshot) = self.cache.get_all() {
            let found = snapshot.into_iter().find(|record| record.id == id);
            if let Some(record) = &found {
                self.cache.put_by_id(record.clone());
            }
            debug!(
                "event=task_get module=service status=ok source=snapshot id={id} found={}",
                found.is_some()
            );
            return Ok(found);
        }

        let records = self.repo.load_all()?;
        let found = records.into_iter().find(|record| record.id == id);
        if let Some(record) = &found {
            self.cache.put_by_id(record.clone());
        }
        debug!(
            "event=task_get module=service status=ok source=store id={id} found={}",
            found.is_some()
        );
        Ok(found)
    }

    /// Validates and creates a record; the store assigns id and creation
    /// timestamp.
    ///
    /// On success the now-stale snapshot is dropped and the per-id entry for
    /// the new record is primed. A failed insert leaves the cache untouched.
    pub fn create(&self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        draft.validate()?;

        let record = self.repo.insert(draft)?;
        self.cache.invalidate_all();
        self.cache.put_by_id(record.clone());
        debug!(
            "event=task_create module=service status=ok id={}",
            record.id
        );
        Ok(record)
    }

    /// Applies a partial update to the record with `id`.
    ///
    /// The merge base is always loaded fresh from the store. Only fields
    /// present in the patch replace stored values; a `completed` change
    /// re-enforces the completion-timestamp invariant. Returns the merged
    /// record after it has been written back.
    pub fn update(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<TaskRecord> {
        let mut record = self
            .repo
            .load_all()?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(RepoError::NotFound(id))?;

        record.apply_patch(patch, now_epoch_ms());
        record.validate()?;
        self.repo.update(&record)?;

        self.cache.invalidate_all();
        self.cache.put_by_id(record.clone());
        debug!("event=task_update module=service status=ok id={id}");
        Ok(record)
    }

    /// Deletes the record with `id`, returning whether a deletion occurred.
    ///
    /// A not-found delete triggers no cache side effects.
    pub fn delete(&self, id: TaskId) -> RepoResult<bool> {
        let deleted = self.repo.delete(id)?;
        if deleted {
            self.cache.invalidate_all();
            self.cache.remove_by_id(id);
        }
        debug!("event=task_delete module=service status=ok id={id} deleted={deleted}");
        Ok(deleted)
    }
}
