//! Task record model.
//!
//! # Responsibility
//! - Define the canonical task record plus the create/patch payloads.
//! - Provide lifecycle helpers for the completion timestamp.
//!
//! # Invariants
//! - `id` is assigned by the persistent store and never reused.
//! - `completed_at` is `Some` exactly when `completed` is true.
//! - `created_at` is set once at insert and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned record identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = i64;

/// Canonical task record as held by the store, the cache and the wire.
///
/// Wire field names follow the external JSON schema (`createdAt`,
/// `completedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Store-assigned identifier, monotonic across the store lifetime.
    pub id: TaskId,
    /// Required short summary. Non-empty after trimming.
    pub title: String,
    /// Optional free-form detail text.
    pub description: Option<String>,
    /// Completion flag. Coupled to `completed_at`.
    pub completed: bool,
    /// Unix epoch milliseconds, assigned by the store at insert.
    pub created_at: i64,
    /// Unix epoch milliseconds of the false→true completion transition.
    pub completed_at: Option<i64>,
}

/// Create payload. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Records may be created already completed; the store then stamps
    /// `completed_at` alongside `created_at`.
    #[serde(default)]
    pub completed: bool,
}

/// Partial update payload. A `None` field leaves the stored value untouched.
///
/// Absent and `null` JSON fields both decode to `None`, so this payload
/// cannot express "clear the description"; senders replace it with an empty
/// string instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns true when no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Validation failure for task payloads and persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// `completed` and `completed_at` disagree.
    CompletionTimestampMismatch { completed: bool },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::CompletionTimestampMismatch { completed: true } => {
                write!(f, "completed task is missing its completion timestamp")
            }
            Self::CompletionTimestampMismatch { completed: false } => {
                write!(f, "open task must not carry a completion timestamp")
            }
        }
    }
}

impl Error for TaskValidationError {}

impl TaskRecord {
    /// Checks record invariants.
    ///
    /// Used on every write path before persistence and on rows decoded from
    /// storage, so corrupt state is rejected instead of masked.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.completed != self.completed_at.is_some() {
            return Err(TaskValidationError::CompletionTimestampMismatch {
                completed: self.completed,
            });
        }
        Ok(())
    }

    /// Sets the completion flag, keeping `completed_at` coupled to it.
    ///
    /// Only a false→true transition stamps `now_ms`; re-completing an
    /// already completed record keeps the original timestamp.
    pub fn set_completed(&mut self, completed: bool, now_ms: i64) {
        if completed {
            if !self.completed {
                self.completed_at = Some(now_ms);
            }
        } else {
            self.completed_at = None;
        }
        self.completed = completed;
    }

    /// Applies a partial update in place. Fields absent from the patch keep
    /// their current value; `created_at` and `id` are never touched.
    pub fn apply_patch(&mut self, patch: &TaskPatch, now_ms: i64) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(completed) = patch.completed {
            self.set_completed(completed, now_ms);
        }
    }
}

impl TaskDraft {
    /// Creates a draft with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: false,
        }
    }

    /// Checks create-payload invariants before any store call.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
