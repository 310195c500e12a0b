//! Task record cache.
//!
//! # Responsibility
//! - Cache the full record snapshot and individual records by id.
//! - Guarantee callers never observe a partially updated snapshot.
//!
//! # Invariants
//! - Entries never expire by time; removal happens only through explicit
//!   `remove_by_id`/`invalidate_all` calls.
//! - `put_all` replaces the snapshot without reconciling per-id entries.
//! - No I/O; every operation is infallible.

use crate::model::task::{TaskId, TaskRecord};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct CacheInner {
    snapshot: Option<Vec<TaskRecord>>,
    by_id: HashMap<TaskId, TaskRecord>,
}

/// Synchronized in-memory cache over task records.
///
/// Intended to be owned by a coordinator instance rather than held in
/// process-wide state, so tests can build isolated service/cache/store
/// triples.
#[derive(Debug, Default)]
pub struct TaskCache {
    inner: RwLock<CacheInner>,
}

impl TaskCache {
    /// Creates an empty (cold) cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached full snapshot, or `None` when cold/invalidated.
    pub fn get_all(&self) -> Option<Vec<TaskRecord>> {
        self.read().snapshot.clone()
    }

    /// Replaces the full snapshot atomically.
    pub fn put_all(&self, records: Vec<TaskRecord>) {
        self.write().snapshot = Some(records);
    }

    /// Returns the cached record for `id`, if present.
    pub fn get_by_id(&self, id: TaskId) -> Option<TaskRecord> {
        self.read().by_id.get(&id).cloned()
    }

    /// Inserts or replaces the per-id entry for `record`.
    pub fn put_by_id(&self, record: TaskRecord) {
        self.write().by_id.insert(record.id, record);
    }

    /// Removes the per-id entry for `id`. No-op when absent.
    pub fn remove_by_id(&self, id: TaskId) {
        self.write().by_id.remove(&id);
    }

    /// Clears the snapshot and all per-id entries in one critical section,
    /// leaving the cache equivalent to a freshly constructed one.
    pub fn invalidate_all(&self) {
        let mut inner = self.write();
        inner.snapshot = None;
        inner.by_id.clear();
    }

    // A panicked writer cannot leave the map or snapshot torn (each write is
    // a single assignment), so a poisoned lock is recovered, not propagated.
    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::TaskCache;
    use crate::model::task::TaskRecord;

    fn record(id: i64, title: &str) -> TaskRecord {
        TaskRecord {
            id,
            title: title.to_string(),
            description: None,
            completed: false,
            created_at: 1_700_000_000_000 + id,
            completed_at: None,
        }
    }

    #[test]
    fn cold_cache_reports_absent() {
        let cache = TaskCache::new();
        assert_eq!(cache.get_all(), None);
        assert_eq!(cache.get_by_id(1), None);
    }

    #[test]
    fn put_all_replaces_prior_snapshot() {
        let cache = TaskCache::new();
        cache.put_all(vec![record(1, "first")]);
        cache.put_all(vec![record(2, "second")]);

        let snapshot = cache.get_all().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, 2);
    }

    #[test]
    fn put_all_does_not_reconcile_per_id_entries() {
        let cache = TaskCache::new();
        cache.put_by_id(record(1, "stale title"));
        cache.put_all(vec![record(1, "fresh title")]);

        // Per-id entries are independent of the snapshot slot.
        assert_eq!(cache.get_by_id(1).unwrap().title, "stale title");
    }

    #[test]
    fn remove_by_id_is_a_noop_when_absent() {
        let cache = TaskCache::new();
        cache.remove_by_id(42);
        cache.put_by_id(record(42, "kept"));
        cache.remove_by_id(42);
        assert_eq!(cache.get_by_id(42), None);
    }

    #[test]
    fn invalidate_all_restores_cold_state() {
        let cache = TaskCache::new();
        cache.put_all(vec![record(1, "a"), record(2, "b")]);
        cache.put_by_id(record(1, "a"));

        cache.invalidate_all();

        assert_eq!(cache.get_all(), None);
        assert_eq!(cache.get_by_id(1), None);
    }
}
