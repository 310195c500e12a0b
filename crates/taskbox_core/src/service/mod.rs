//! Coordination services between callers, cache and persistent store.
//!
//! # Responsibility
//! - Orchestrate cache-aside reads and write-through-then-invalidate
//!   writes.
//! - Keep HTTP/adapter layers decoupled from storage and cache details.

pub mod task_service;
