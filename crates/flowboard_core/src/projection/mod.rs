//! Derived, read-only board views.

pub mod board;
