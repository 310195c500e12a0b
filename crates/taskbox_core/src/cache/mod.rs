//! In-memory read cache for task records.
//!
//! # Responsibility
//! - Hold a best-effort copy of store contents to avoid redundant loads.
//! - Keep all cache mutation internally synchronized.
//!
//! # Invariants
//! - The cache owns no persistence and is rebuildable from the store at any
//!   time; it can be absent, never observably wrong about content.
//! - `invalidate_all` is the only operation guaranteed to restore the cold
//!   state.

pub mod task_cache;
