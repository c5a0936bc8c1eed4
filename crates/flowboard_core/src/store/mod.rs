//! Durable task storage.
//!
//! # Responsibility
//! - Define the narrow read/write contract every component uses to reach
//!   task data.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - A write that returns `Ok` is durable; nothing is buffered in memory.
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod task_store;
