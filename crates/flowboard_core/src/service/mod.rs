//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store writes and projection updates into use-case APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod board_service;
