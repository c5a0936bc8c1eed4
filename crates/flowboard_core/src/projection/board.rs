//! Three-column board projection.
//!
//! # Responsibility
//! - Group stored tasks into `todo`, `inProgress` and `done` columns.
//! - Support both full recomputation and incremental patching.
//!
//! # Invariants
//! - Tombstoned tasks never appear in any column.
//! - Column order is store placement order; nothing is re-sorted.
//! - Recomputing from the store yields the same columns as applying the
//!   same mutations incrementally.
//! - The projection is never a source of truth; it can always be rebuilt.

use crate::model::task::{Task, TaskId, TaskStatus};

/// Aggregate counters shown above the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardCounts {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardProjection {
    todo: Vec<Task>,
    in_progress: Vec<Task>,
    done: Vec<Task>,
}

impl BoardProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the projection from the full store contents.
    ///
    /// `tasks` must be in store placement order.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut projection = Self::new();
        for task in tasks {
            projection.append(task);
        }
        projection
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Done => &mut self.done,
        }
    }

    /// Appends `task` to the end of its status column. Tombstones are
    /// dropped.
    pub fn append(&mut self, task: Task) {
        if !task.is_active() {
            return;
        }
        self.column_mut(task.status).push(task);
    }

    /// Replaces the entry with the same id in `task.status`'s column,
    /// keeping its position. Returns `false` when no entry matched.
    pub fn replace(&mut self, task: Task) -> bool {
        let column = self.column_mut(task.status);
        match column.iter_mut().find(|entry| entry.id == task.id) {
            Some(entry) => {
                *entry = task;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the entry for `id` from `status`'s column.
    pub fn take(&mut self, status: TaskStatus, id: TaskId) -> Option<Task> {
        let column = self.column_mut(status);
        let index = column.iter().position(|entry| entry.id == id)?;
        Some(column.remove(index))
    }

    pub fn find(&self, status: TaskStatus, id: TaskId) -> Option<&Task> {
        self.column(status).iter().find(|entry| entry.id == id)
    }

    /// Returns the column currently holding `id`.
    pub fn locate(&self, id: TaskId) -> Option<TaskStatus> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| self.find(*status, id).is_some())
    }

    pub fn counts(&self) -> BoardCounts {
        BoardCounts {
            total: self.todo.len() + self.in_progress.len() + self.done.len(),
            todo: self.todo.len(),
            in_progress: self.in_progress.len(),
            done: self.done.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total == 0
    }
}
