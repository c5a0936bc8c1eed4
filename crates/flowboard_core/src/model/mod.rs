//! Domain model for board tasks.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` assigned at creation.
//! - Deletion is represented by soft-delete tombstones until the remote
//!   authority acknowledges it.

pub mod task;
