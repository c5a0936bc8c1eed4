//! Offline-first task board core.
//!
//! Owns the durable task store, the board projection, the mutation API and
//! the sync engine that pushes local changes to the remote task service.
//! Presentation shells call into `FlowBoard` and render what it reports.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod projection;
pub mod runtime;
pub mod service;
pub mod store;
pub mod sync;

pub use config::{BoardConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    Priority, Task, TaskContent, TaskId, TaskStatus, UnknownVariant, ValidationError,
};
pub use projection::board::{BoardCounts, BoardProjection};
pub use runtime::FlowBoard;
pub use service::board_service::{BoardError, BoardResult, BoardService};
pub use store::task_store::{
    PendingTask, SqliteTaskStore, StoreError, StoreResult, TaskPatch, TaskStore,
};
pub use sync::connectivity::{
    ConnectivityMonitor, ConnectivityState, ConnectivityTransition, ReachabilitySignal,
};
pub use sync::engine::{SyncEngine, SyncReport, SyncSettings};
pub use sync::http_remote::HttpRemoteEndpoint;
pub use sync::remote::{PushAck, PushMethod, PushRequest, RemoteEndpoint, SyncError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
