#![allow(dead_code)]

use flowboard_core::db::DbError;
use flowboard_core::{
    PendingTask, PushAck, PushMethod, PushRequest, RemoteEndpoint, SqliteTaskStore, StoreError,
    StoreResult, SyncError, Task, TaskId, TaskPatch, TaskStore,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Remote double with idempotent upsert / delete-if-exists semantics.
#[derive(Default)]
pub struct FakeRemote {
    pub entities: RefCell<HashMap<TaskId, Task>>,
    pub pushes: RefCell<Vec<(PushMethod, TaskId)>>,
    pub timeouts: RefCell<Vec<Duration>>,
    failing: RefCell<HashSet<TaskId>>,
    drop_acks: Cell<bool>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes for `id` fail before reaching the remote state.
    pub fn fail_for(&self, id: TaskId) {
        self.failing.borrow_mut().insert(id);
    }

    pub fn recover(&self, id: TaskId) {
        self.failing.borrow_mut().remove(&id);
    }

    /// Pushes are applied remotely but the acknowledgement is lost.
    pub fn set_drop_acks(&self, enabled: bool) {
        self.drop_acks.set(enabled);
    }

    pub fn push_count(&self) -> usize {
        self.pushes.borrow().len()
    }

    pub fn entity(&self, id: TaskId) -> Option<Task> {
        self.entities.borrow().get(&id).cloned()
    }
}

impl RemoteEndpoint for FakeRemote {
    fn endpoint_id(&self) -> &str {
        "fake"
    }

    fn push(&self, request: &PushRequest, timeout: Duration) -> Result<PushAck, SyncError> {
        self.pushes
            .borrow_mut()
            .push((request.method, request.task_id()));
        self.timeouts.borrow_mut().push(timeout);

        if self.failing.borrow().contains(&request.task_id()) {
            return Err(SyncError::Transport("connection refused".to_string()));
        }

        let mut entities = self.entities.borrow_mut();
        match request.method {
            PushMethod::Upsert => {
                entities.insert(request.task_id(), request.task.clone());
            }
            PushMethod::Delete => {
                entities.remove(&request.task_id());
            }
        }

        if self.drop_acks.get() {
            return Err(SyncError::Timeout(timeout));
        }
        Ok(PushAck { status: 200 })
    }
}

/// Store double that can be switched into a failing state.
pub struct FlakyStore<'conn> {
    inner: SqliteTaskStore<'conn>,
    failing: Cell<bool>,
}

impl<'conn> FlakyStore<'conn> {
    pub fn new(inner: SqliteTaskStore<'conn>) -> Self {
        Self {
            inner,
            failing: Cell::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.get() {
            return Err(StoreError::Db(DbError::Io(std::io::Error::other(
                "quota exceeded",
            ))));
        }
        Ok(())
    }
}

impl TaskStore for FlakyStore<'_> {
    fn put(&self, task: &Task) -> StoreResult<()> {
        self.check()?;
        self.inner.put(task)
    }

    fn patch(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<()> {
        self.check()?;
        self.inner.patch(id, patch)
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.inner.get(id)
    }

    fn list_all(&self) -> StoreResult<Vec<Task>> {
        self.inner.list_all()
    }

    fn list_unsynced(&self) -> StoreResult<Vec<PendingTask>> {
        self.inner.list_unsynced()
    }

    fn mark_synced(&self, id: TaskId, revision: i64) -> StoreResult<bool> {
        self.check()?;
        self.inner.mark_synced(id, revision)
    }

    fn purge_synced_tombstones(&self) -> StoreResult<usize> {
        self.check()?;
        self.inner.purge_synced_tombstones()
    }
}
