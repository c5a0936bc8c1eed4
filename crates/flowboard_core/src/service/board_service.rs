//! Task mutation use-cases.
//!
//! # Responsibility
//! - Be the only write path for task data.
//! - Keep the durable store and the board projection consistent.
//!
//! # Invariants
//! - Validation runs before any write; a rejected call changes nothing.
//! - The durable write completes before the projection is touched; a failed
//!   write leaves the projection as it was.
//! - Every successful mutation persists `synced = false`. Nothing here talks
//!   to the remote endpoint.

use crate::model::task::{Priority, Task, TaskContent, TaskId, TaskStatus, ValidationError};
use crate::projection::board::{BoardCounts, BoardProjection};
use crate::store::task_store::{StoreError, StoreResult, TaskPatch, TaskStore};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Error returned by board mutations.
#[derive(Debug)]
pub enum BoardError {
    /// Input rejected; shown to the user.
    Validation(ValidationError),
    /// Durable store failed or the target record is missing.
    Storage(StoreError),
}

impl BoardError {
    /// Returns whether the error should be shown to the user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for BoardError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for BoardError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

/// Board use-case service over an injected task store.
pub struct BoardService<S: TaskStore> {
    store: S,
    projection: BoardProjection,
}

impl<S: TaskStore> BoardService<S> {
    /// Creates a service and builds the projection from the store.
    pub fn load(store: S) -> StoreResult<Self> {
        let projection = BoardProjection::from_tasks(store.list_all()?);
        let counts = projection.counts();
        info!(
            "event=board_load module=service status=ok total={} in_progress={} done={}",
            counts.total, counts.in_progress, counts.done
        );
        Ok(Self { store, projection })
    }

    /// Recomputes the projection from scratch.
    ///
    /// On failure the previous projection is kept.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.projection = BoardProjection::from_tasks(self.store.list_all()?);
        Ok(())
    }

    pub fn projection(&self) -> &BoardProjection {
        &self.projection
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.projection.column(status)
    }

    pub fn counts(&self) -> BoardCounts {
        self.projection.counts()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a task at the end of `column`.
    ///
    /// # Errors
    /// - `Validation` for blank title or description; nothing is written.
    /// - `Storage` when the write fails; the projection is unchanged.
    pub fn create(
        &mut self,
        column: TaskStatus,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> BoardResult<Task> {
        let content = TaskContent::new(title, description, priority)?;
        let task = Task::new(column, content);

        self.store.put(&task)?;
        self.projection.append(task.clone());

        info!(
            "event=task_create module=service status=ok task_id={} column={}",
            task.id,
            column.as_str()
        );
        Ok(task)
    }

    /// Replaces title, description and priority, keeping the task's column.
    ///
    /// # Errors
    /// - `Validation` for blank title or description; nothing is written.
    /// - `Storage(NotFound)` when the task is not on the board.
    pub fn edit(
        &mut self,
        id: TaskId,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> BoardResult<Task> {
        let content = TaskContent::new(title, description, priority)?;
        let column = self
            .projection
            .locate(id)
            .ok_or(StoreError::NotFound(id))?;

        self.store.patch(
            id,
            &TaskPatch {
                title: Some(content.title().to_string()),
                description: Some(content.description().to_string()),
                priority: Some(content.priority()),
                synced: Some(false),
                ..TaskPatch::default()
            },
        )?;

        let mut task = self
            .projection
            .find(column, id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;
        task.apply_content(&content);
        self.projection.replace(task.clone());

        info!(
            "event=task_edit module=service status=ok task_id={} column={}",
            id,
            column.as_str()
        );
        Ok(task)
    }

    /// Moves a task to the end of `to`.
    ///
    /// Returns `false` for a no-op: same column, task no longer in `from`,
    /// or task gone from the store (its stale entry is dropped).
    pub fn move_task(&mut self, id: TaskId, from: TaskStatus, to: TaskStatus) -> BoardResult<bool> {
        if from == to {
            return Ok(false);
        }
        if self.projection.find(from, id).is_none() {
            debug!(
                "event=task_move module=service status=skip task_id={} reason=not_in_column",
                id
            );
            return Ok(false);
        }

        let patch = TaskPatch {
            status: Some(to),
            synced: Some(false),
            ..TaskPatch::default()
        };
        match self.store.patch(id, &patch) {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                warn!(
                    "event=task_move module=service status=skip task_id={} reason=not_in_store",
                    id
                );
                self.projection.take(from, id);
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }

        if let Some(mut task) = self.projection.take(from, id) {
            task.status = to;
            task.synced = false;
            self.projection.append(task);
        }

        info!(
            "event=task_move module=service status=ok task_id={} from={} to={}",
            id,
            from.as_str(),
            to.as_str()
        );
        Ok(true)
    }

    /// Tombstones a task and removes it from the board immediately.
    ///
    /// # Errors
    /// - `Storage(NotFound)` when the store has no such task.
    pub fn soft_delete(&mut self, column: TaskStatus, id: TaskId) -> BoardResult<()> {
        self.store.patch(
            id,
            &TaskPatch {
                deleted: Some(true),
                synced: Some(false),
                ..TaskPatch::default()
            },
        )?;

        if self.projection.take(column, id).is_none() {
            if let Some(actual) = self.projection.locate(id) {
                self.projection.take(actual, id);
            }
        }

        info!(
            "event=task_delete module=service status=ok task_id={} column={}",
            id,
            column.as_str()
        );
        Ok(())
    }
}
