//! Remote sync endpoint contract.
//!
//! The remote authority is expected to treat both methods as idempotent by
//! task id: upsert on create, delete-if-exists on delete. The engine relies
//! on that to re-push a record whose acknowledgement was lost.

use crate::model::task::{Task, TaskId};
use crate::store::task_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Push method chosen from the record's tombstone flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMethod {
    /// Create-or-update; used while `deleted == false`.
    Upsert,
    /// Delete-if-exists; used once `deleted == true`.
    Delete,
}

impl PushMethod {
    pub fn for_task(task: &Task) -> Self {
        if task.deleted {
            Self::Delete
        } else {
            Self::Upsert
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

/// One push attempt: the method plus the record's full current fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub method: PushMethod,
    pub task: Task,
}

impl PushRequest {
    pub fn for_task(task: Task) -> Self {
        Self {
            method: PushMethod::for_task(&task),
            task,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task.id
    }
}

/// Remote acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushAck {
    /// Transport status code, or `0` for non-HTTP endpoints.
    pub status: u16,
}

/// Internal sync failure. Never surfaced to the user.
#[derive(Debug)]
pub enum SyncError {
    /// Network-level failure before a response arrived.
    Transport(String),
    /// The request exceeded its bound.
    Timeout(Duration),
    /// The remote answered with a non-success status.
    Rejected { status: u16 },
    /// Reading or flagging local records failed.
    Store(StoreError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Timeout(timeout) => {
                write!(f, "request timed out after {}ms", timeout.as_millis())
            }
            Self::Rejected { status } => write!(f, "remote rejected push with status {status}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Remote authority reached by the sync engine.
pub trait RemoteEndpoint {
    /// Short identifier used in log lines.
    fn endpoint_id(&self) -> &str;

    /// Delivers one record. Implementations must give up after `timeout`
    /// and report `SyncError::Timeout`.
    fn push(&self, request: &PushRequest, timeout: Duration) -> Result<PushAck, SyncError>;
}

impl<R: RemoteEndpoint + ?Sized> RemoteEndpoint for &R {
    fn endpoint_id(&self) -> &str {
        (**self).endpoint_id()
    }

    fn push(&self, request: &PushRequest, timeout: Duration) -> Result<PushAck, SyncError> {
        (**self).push(request, timeout)
    }
}

impl<R: RemoteEndpoint + ?Sized> RemoteEndpoint for Box<R> {
    fn endpoint_id(&self) -> &str {
        (**self).endpoint_id()
    }

    fn push(&self, request: &PushRequest, timeout: Duration) -> Result<PushAck, SyncError> {
        (**self).push(request, timeout)
    }
}
