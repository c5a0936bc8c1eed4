//! Push-only sync engine.
//!
//! # Responsibility
//! - Turn every unsynced record into one push job per run.
//! - Flag a record synced only after the remote acknowledged the exact
//!   revision that was pushed.
//!
//! # Invariants
//! - At most one push per task id per run.
//! - A failed push leaves the record unsynced; there is no in-run retry or
//!   backoff, the next trigger picks it up again.
//! - The engine only ever writes the `synced` flag and purges acknowledged
//!   tombstones; task content is never rewritten from a snapshot.

use crate::store::task_store::{PendingTask, TaskStore};
use crate::sync::remote::{PushRequest, RemoteEndpoint, SyncError};
use log::{debug, info, warn};
use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Upper bound applied to each push request.
    pub request_timeout: Duration,
    /// Remove tombstones once their deletion is acknowledged.
    pub purge_acknowledged_tombstones: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            purge_acknowledged_tombstones: true,
        }
    }
}

/// Outcome counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Jobs built from unsynced records.
    pub queued: usize,
    /// Pushes acknowledged and flagged synced.
    pub acknowledged: usize,
    /// Pushes that failed; records stay unsynced.
    pub failed: usize,
    /// Acknowledged pushes whose record was edited meanwhile.
    pub superseded: usize,
    /// Tombstones removed after acknowledgement.
    pub purged: usize,
    /// The run did not execute because another one was in progress.
    pub skipped: bool,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Returns whether every queued record was flagged synced.
    pub fn is_converged(&self) -> bool {
        !self.skipped && self.failed == 0 && self.superseded == 0
    }
}

struct PushJob {
    request: PushRequest,
    revision: i64,
}

/// Work queue for one run, coalesced by task id.
struct PushQueue {
    jobs: VecDeque<PushJob>,
}

impl PushQueue {
    fn from_pending(pending: Vec<PendingTask>) -> Self {
        let mut seen = HashSet::new();
        let jobs = pending
            .into_iter()
            .filter(|entry| seen.insert(entry.task.id))
            .map(|entry| PushJob {
                revision: entry.revision,
                request: PushRequest::for_task(entry.task),
            })
            .collect();
        Self { jobs }
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }

    fn pop(&mut self) -> Option<PushJob> {
        self.jobs.pop_front()
    }
}

enum JobOutcome {
    Acknowledged,
    Superseded,
    Failed,
}

pub struct SyncEngine<S: TaskStore, R: RemoteEndpoint> {
    store: S,
    remote: R,
    settings: SyncSettings,
    running: Cell<bool>,
}

impl<S: TaskStore, R: RemoteEndpoint> SyncEngine<S, R> {
    pub fn new(store: S, remote: R, settings: SyncSettings) -> Self {
        Self {
            store,
            remote,
            settings,
            running: Cell::new(false),
        }
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Pushes every unsynced record once.
    ///
    /// # Errors
    /// - `SyncError::Store` when unsynced records cannot be listed. Per-push
    ///   failures are counted in the report, not returned.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        if self.running.replace(true) {
            debug!("event=sync_run module=sync status=skip reason=already_running");
            return Ok(SyncReport::skipped());
        }
        let result = self.run_queue();
        self.running.set(false);
        result
    }

    fn run_queue(&self) -> Result<SyncReport, SyncError> {
        let started_at = Instant::now();
        let mut queue = PushQueue::from_pending(self.store.list_unsynced()?);
        let mut report = SyncReport {
            queued: queue.len(),
            ..SyncReport::default()
        };
        info!(
            "event=sync_run module=sync status=start endpoint={} queued={}",
            self.remote.endpoint_id(),
            report.queued
        );

        while let Some(job) = queue.pop() {
            match self.push_job(&job) {
                JobOutcome::Acknowledged => report.acknowledged += 1,
                JobOutcome::Superseded => report.superseded += 1,
                JobOutcome::Failed => report.failed += 1,
            }
        }

        if self.settings.purge_acknowledged_tombstones {
            match self.store.purge_synced_tombstones() {
                Ok(purged) => report.purged = purged,
                Err(err) => warn!(
                    "event=sync_purge module=sync status=error error={}",
                    err
                ),
            }
        }

        info!(
            "event=sync_run module=sync status=ok duration_ms={} queued={} acknowledged={} failed={} superseded={} purged={}",
            started_at.elapsed().as_millis(),
            report.queued,
            report.acknowledged,
            report.failed,
            report.superseded,
            report.purged
        );
        Ok(report)
    }

    fn push_job(&self, job: &PushJob) -> JobOutcome {
        let task_id = job.request.task_id();
        let method = job.request.method.as_str();

        if let Err(err) = self
            .remote
            .push(&job.request, self.settings.request_timeout)
        {
            warn!(
                "event=sync_push module=sync status=error task_id={} method={} error={}",
                task_id, method, err
            );
            return JobOutcome::Failed;
        }

        match self.store.mark_synced(task_id, job.revision) {
            Ok(true) => {
                debug!(
                    "event=sync_push module=sync status=ok task_id={} method={} revision={}",
                    task_id, method, job.revision
                );
                JobOutcome::Acknowledged
            }
            Ok(false) => {
                debug!(
                    "event=sync_push module=sync status=superseded task_id={} method={} revision={}",
                    task_id, method, job.revision
                );
                JobOutcome::Superseded
            }
            Err(err) => {
                warn!(
                    "event=sync_mark module=sync status=error task_id={} error={}",
                    task_id, err
                );
                JobOutcome::Failed
            }
        }
    }
}
