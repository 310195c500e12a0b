//! Domain model for task records.
//!
//! # Responsibility
//! - Define the canonical record shape shared by storage backends, the
//!   cache and the coordinator service.
//! - Own validation and the completion-timestamp lifecycle rules.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `TaskId` that is never
//!   reused, even after deletion.
//! - `completed == true` exactly when `completed_at` is set.

pub mod task;
