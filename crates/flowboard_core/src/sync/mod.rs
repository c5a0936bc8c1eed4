//! Offline-first synchronization with the remote task service.
//!
//! # Responsibility
//! - Define the remote endpoint contract (`remote`) and its HTTP adapter.
//! - Push unsynced records opportunistically (`engine`).
//! - Track reachability and report transitions (`connectivity`).
//!
//! # Invariants
//! - Sync failures are logged and retried on the next trigger; they never
//!   alter local task content.

pub mod connectivity;
pub mod engine;
pub mod http_remote;
pub mod remote;
