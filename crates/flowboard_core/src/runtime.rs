//! Presentation-facing facade.
//!
//! # Responsibility
//! - Wire the board service, sync engine and connectivity monitor together.
//! - Expose the columns, counters, connectivity state and the four
//!   mutations as the only surface presentation code uses.
//!
//! # Invariants
//! - Sync outcomes are logged, never returned as errors.
//! - A sync run happens at startup when online, and on every
//!   `Offline -> Online` transition.

use crate::model::task::{Priority, Task, TaskId, TaskStatus};
use crate::projection::board::{BoardCounts, BoardProjection};
use crate::service::board_service::{BoardResult, BoardService};
use crate::store::task_store::{StoreResult, TaskStore};
use crate::sync::connectivity::{
    ConnectivityMonitor, ConnectivityState, ConnectivityTransition, ReachabilitySignal,
};
use crate::sync::engine::{SyncEngine, SyncReport, SyncSettings};
use crate::sync::remote::RemoteEndpoint;
use log::{info, warn};

pub struct FlowBoard<S: TaskStore + Clone, R: RemoteEndpoint> {
    board: BoardService<S>,
    engine: Option<SyncEngine<S, R>>,
    monitor: ConnectivityMonitor,
}

impl<S: TaskStore + Clone, R: RemoteEndpoint> FlowBoard<S, R> {
    /// Loads the board from `store` and, when `initial` is online and a
    /// remote is configured, runs one startup sync.
    ///
    /// `remote = None` keeps the board fully local.
    pub fn open(
        store: S,
        remote: Option<R>,
        settings: SyncSettings,
        initial: ConnectivityState,
    ) -> StoreResult<Self> {
        let board = BoardService::load(store.clone())?;
        let engine = remote.map(|remote| SyncEngine::new(store, remote, settings));
        let mut flow_board = Self {
            board,
            engine,
            monitor: ConnectivityMonitor::new(initial),
        };
        flow_board.sync_now();
        Ok(flow_board)
    }

    pub fn create(
        &mut self,
        column: TaskStatus,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> BoardResult<Task> {
        self.board.create(column, title, description, priority)
    }

    pub fn edit(
        &mut self,
        id: TaskId,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> BoardResult<Task> {
        self.board.edit(id, title, description, priority)
    }

    pub fn move_task(&mut self, id: TaskId, from: TaskStatus, to: TaskStatus) -> BoardResult<bool> {
        self.board.move_task(id, from, to)
    }

    pub fn soft_delete(&mut self, column: TaskStatus, id: TaskId) -> BoardResult<()> {
        self.board.soft_delete(column, id)
    }

    pub fn projection(&self) -> &BoardProjection {
        self.board.projection()
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.board.column(status)
    }

    pub fn counts(&self) -> BoardCounts {
        self.board.counts()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.monitor.state()
    }

    pub fn is_sync_configured(&self) -> bool {
        self.engine.is_some()
    }

    pub fn store(&self) -> &S {
        self.board.store()
    }

    /// Registers a presentation listener for connectivity transitions.
    pub fn subscribe_connectivity(
        &mut self,
        listener: impl FnMut(ConnectivityTransition) + 'static,
    ) {
        self.monitor.subscribe(listener);
    }

    /// Feeds one platform online/offline event. Returns the sync report
    /// when the event brought the board back online.
    pub fn set_online(&mut self, online: bool) -> Option<SyncReport> {
        let transition = self.monitor.update(online)?;
        self.after_transition(transition)
    }

    /// Samples a reachability probe; same contract as `set_online`.
    pub fn poll_connectivity(&mut self, signal: &dyn ReachabilitySignal) -> Option<SyncReport> {
        let transition = self.monitor.poll(signal)?;
        self.after_transition(transition)
    }

    /// Runs the sync engine now. Returns `None` when offline, when no
    /// remote is configured, or when the run could not read the store.
    pub fn sync_now(&mut self) -> Option<SyncReport> {
        if !self.monitor.is_online() {
            return None;
        }
        let engine = self.engine.as_ref()?;

        let report = match engine.run() {
            Ok(report) => report,
            Err(err) => {
                warn!("event=sync_run module=runtime status=error error={}", err);
                return None;
            }
        };

        if report.acknowledged > 0 || report.purged > 0 {
            if let Err(err) = self.board.reload() {
                warn!(
                    "event=board_reload module=runtime status=error error={}",
                    err
                );
            }
        }
        Some(report)
    }

    fn after_transition(&mut self, transition: ConnectivityTransition) -> Option<SyncReport> {
        match transition {
            ConnectivityTransition::WentOnline => {
                info!("event=sync_trigger module=runtime status=start reason=online");
                self.sync_now()
            }
            ConnectivityTransition::WentOffline => None,
        }
    }
}
