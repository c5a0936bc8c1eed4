//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist task records keyed by id, with an index on `synced`.
//! - Track per-record `revision` so sync acknowledgements cannot clear a
//!   newer local edit.
//! - Track per-record `position` so column order survives a reload.
//!
//! # Invariants
//! - Every write that leaves `synced = 0` increments `revision`.
//! - `position` is re-assigned (to the current maximum plus one) on insert
//!   and whenever `status` changes; `list_all` orders by it.
//! - `mark_synced` touches only the `synced` column.

use crate::db::DbError;
use crate::model::task::{Priority, Task, TaskId, TaskStatus, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    status,
    deleted,
    synced,
    revision
FROM tasks";

const NEXT_POSITION_SQL: &str = "(SELECT COALESCE(MAX(position), 0) + 1 FROM tasks)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure. Callers must assume the write did not happen.
#[derive(Debug)]
pub enum StoreError {
    /// Record would violate text invariants; rejected before SQL.
    Validation(ValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial update merged into an existing record. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub deleted: Option<bool>,
    pub synced: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Unsynced record paired with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTask {
    pub task: Task,
    pub revision: i64,
}

/// Durable store contract shared by the mutation API and the sync engine.
pub trait TaskStore {
    /// Inserts or fully replaces one record.
    fn put(&self, task: &Task) -> StoreResult<()>;
    /// Merges named fields into an existing record.
    fn patch(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<()>;
    fn get(&self, id: TaskId) -> StoreResult<Option<Task>>;
    /// Every record, tombstones included, in board placement order.
    fn list_all(&self) -> StoreResult<Vec<Task>>;
    /// Records with `synced = false`, in board placement order.
    fn list_unsynced(&self) -> StoreResult<Vec<PendingTask>>;
    /// Sets `synced = true` only if the record is still at `revision`.
    ///
    /// Returns `false` when a newer local write superseded the pushed
    /// state, or the record is gone.
    fn mark_synced(&self, id: TaskId, revision: i64) -> StoreResult<bool>;
    /// Physically removes tombstones whose deletion was acknowledged.
    fn purge_synced_tombstones(&self) -> StoreResult<usize>;
}

impl<T: TaskStore + ?Sized> TaskStore for &T {
    fn put(&self, task: &Task) -> StoreResult<()> {
        (**self).put(task)
    }

    fn patch(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<()> {
        (**self).patch(id, patch)
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        (**self).get(id)
    }

    fn list_all(&self) -> StoreResult<Vec<Task>> {
        (**self).list_all()
    }

    fn list_unsynced(&self) -> StoreResult<Vec<PendingTask>> {
        (**self).list_unsynced()
    }

    fn mark_synced(&self, id: TaskId, revision: i64) -> StoreResult<bool> {
        (**self).mark_synced(id, revision)
    }

    fn purge_synced_tombstones(&self) -> StoreResult<usize> {
        (**self).purge_synced_tombstones()
    }
}

/// SQLite-backed task store.
#[derive(Clone, Copy)]
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn put(&self, task: &Task) -> StoreResult<()> {
        task.validate()?;

        self.conn.execute(
            &format!(
                "INSERT INTO tasks (
                    id,
                    title,
                    description,
                    priority,
                    status,
                    deleted,
                    synced,
                    revision,
                    position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, {NEXT_POSITION_SQL})
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    priority = excluded.priority,
                    deleted = excluded.deleted,
                    synced = excluded.synced,
                    revision = CASE WHEN excluded.synced = 0
                        THEN tasks.revision + 1 ELSE tasks.revision END,
                    position = CASE WHEN tasks.status <> excluded.status
                        THEN excluded.position ELSE tasks.position END,
                    status = excluded.status,
                    updated_at = (strftime('%s', 'now') * 1000);"
            ),
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                task.priority.as_str(),
                task.status.as_str(),
                bool_to_int(task.deleted),
                bool_to_int(task.synced),
            ],
        )?;

        Ok(())
    }

    fn patch(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return match self.get(id)? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(id)),
            };
        }

        let mut assignments: Vec<String> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(ValidationError::MissingTitle.into());
            }
            assignments.push("title = ?".to_string());
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(description) = &patch.description {
            if description.trim().is_empty() {
                return Err(ValidationError::MissingDescription.into());
            }
            assignments.push("description = ?".to_string());
            bind_values.push(Value::Text(description.clone()));
        }
        if let Some(priority) = patch.priority {
            assignments.push("priority = ?".to_string());
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }
        if let Some(status) = patch.status {
            // Evaluated against the pre-update status.
            assignments.push(format!(
                "position = CASE WHEN status <> ? THEN {NEXT_POSITION_SQL} ELSE position END"
            ));
            bind_values.push(Value::Text(status.as_str().to_string()));
            assignments.push("status = ?".to_string());
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(deleted) = patch.deleted {
            assignments.push("deleted = ?".to_string());
            bind_values.push(Value::Integer(bool_to_int(deleted)));
        }
        if let Some(synced) = patch.synced {
            assignments.push("synced = ?".to_string());
            bind_values.push(Value::Integer(bool_to_int(synced)));
            if !synced {
                assignments.push("revision = revision + 1".to_string());
            }
        }
        assignments.push("updated_at = (strftime('%s', 'now') * 1000)".to_string());
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_task_row(row)))
            .optional()?;
        row.transpose().map(|pending| pending.map(|p| p.task))
    }

    fn list_all(&self) -> StoreResult<Vec<Task>> {
        let pending = self.query_tasks(&format!(
            "{TASK_SELECT_SQL} ORDER BY position ASC, id ASC;"
        ))?;
        Ok(pending.into_iter().map(|p| p.task).collect())
    }

    fn list_unsynced(&self) -> StoreResult<Vec<PendingTask>> {
        self.query_tasks(&format!(
            "{TASK_SELECT_SQL} WHERE synced = 0 ORDER BY position ASC, id ASC;"
        ))
    }

    fn mark_synced(&self, id: TaskId, revision: i64) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET synced = 1 WHERE id = ?1 AND revision = ?2;",
            params![id.to_string(), revision],
        )?;
        Ok(changed > 0)
    }

    fn purge_synced_tombstones(&self) -> StoreResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE deleted = 1 AND synced = 1;", [])?;
        Ok(removed)
    }
}

impl SqliteTaskStore<'_> {
    fn query_tasks(&self, sql: &str) -> StoreResult<Vec<PendingTask>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<PendingTask> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| StoreError::InvalidData(format!("invalid id `{id_text}` in tasks.id")))?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid status `{status_text}` in tasks.status"))
    })?;

    let task = Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        status,
        deleted: int_to_bool(row.get("deleted")?, "deleted")?,
        synced: int_to_bool(row.get("synced")?, "synced")?,
    };
    task.validate().map_err(|err| {
        StoreError::InvalidData(format!("task {} violates text invariant: {err}", task.id))
    })?;

    Ok(PendingTask {
        task,
        revision: row.get("revision")?,
    })
}

fn int_to_bool(value: i64, column: &str) -> StoreResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StoreError::InvalidData(format!(
            "invalid {column} value `{other}` in tasks.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
