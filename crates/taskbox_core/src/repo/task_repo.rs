//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistent-store API the coordinator builds on: load-all,
//!   insert (id assignment), update-by-id, delete-by-id.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Each operation is applied atomically; no cross-operation transaction
//!   is offered to the layer above.
//! - Inserted rows receive a store-assigned monotonic id that is never
//!   reused after deletion (`AUTOINCREMENT`).
//! - `load_all` orders rows by `created_at DESC, id DESC`.

use crate::db::migrations::{applied_version, latest_version};
use crate::db::DbError;
use crate::model::task::{now_epoch_ms, TaskDraft, TaskId, TaskRecord, TaskValidationError};
use crate::repo::file_repo::FileStoreError;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    completed,
    created_at,
    completed_at
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for task persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    File(FileStoreError),
    NotFound(TaskId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing from the connected database.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::File(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::File(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistent-store interface consumed by the coordinator.
pub trait TaskRepository {
    /// Loads every record, ordered by creation time descending.
    fn load_all(&self) -> RepoResult<Vec<TaskRecord>>;
    /// Inserts a draft, assigning the identifier and creation timestamp.
    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskRecord>;
    /// Replaces the stored record with the same id. `NotFound` when absent.
    /// `created_at` is never rewritten.
    fn update(&self, record: &TaskRecord) -> RepoResult<()>;
    /// Deletes by id. Returns whether a row was removed.
    fn delete(&self, id: TaskId) -> RepoResult<bool>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for Box<R> {
    fn load_all(&self) -> RepoResult<Vec<TaskRecord>> {
        (**self).load_all()
    }

    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        (**self).insert(draft)
    }

    fn update(&self, record: &TaskRecord) -> RepoResult<()> {
        (**self).update(record)
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}

/// SQLite-backed task store.
///
/// Owns its connection behind a mutex so independent request handlers can
/// share one store instance; per-statement serialization is the only
/// cross-caller coupling.
pub struct SqliteTaskRepository {
    conn: Mutex<Connection>,
}

impl SqliteTaskRepository {
    /// Wraps a migrated connection, rejecting connections whose schema was
    /// not bootstrapped through `db::open_db`/`open_db_in_memory`.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = applied_version(&conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let tasks_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks'
            );",
            [],
            |row| row.get(0),
        )?;
        if tasks_exists != 1 {
            return Err(RepoError::MissingRequiredTable("tasks"));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // Statements never unwind while holding the guard with the connection
    // in a torn state, so poisoning is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn load_all(&self) -> RepoResult<Vec<TaskRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{TASK_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_task_row(row)?);
        }

        Ok(records)
    }

    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskRecord> {
        draft.validate()?;

        let created_at = now_epoch_ms();
        let completed_at = draft.completed.then_some(created_at);

        let conn = self.lock();
        conn.execute(
            "INSERT INTO tasks (title, description, completed, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.title.as_str(),
                draft.description.as_deref(),
                bool_to_int(draft.completed),
                created_at,
                completed_at,
            ],
        )?;

        Ok(TaskRecord {
            id: conn.last_insert_rowid(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            completed: draft.completed,
            created_at,
            completed_at,
        })
    }

    fn update(&self, record: &TaskRecord) -> RepoResult<()> {
        record.validate()?;

        let changed = self.lock().execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                completed = ?3,
                completed_at = ?4
             WHERE id = ?5;",
            params![
                record.title.as_str(),
                record.description.as_deref(),
                bool_to_int(record.completed),
                record.completed_at,
                record.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }

        Ok(())
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .lock()
            .execute("DELETE FROM tasks WHERE id = ?1;", params![id])?;
        Ok(changed > 0)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskRecord> {
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let record = TaskRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
    };
    record.validate()?;
    Ok(record)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
