// src/engine/mod.rs

//! Execution engine: turns plans into command dispatches.
//!
//! Planning is pure (see [`crate::dag::plan`]); the [`Runner`] is the thin
//! async shell that feeds planned steps to an
//! [`crate::exec::ExecutorBackend`] one command at a time.

pub mod runner;

pub use runner::{RunOutcome, Runner};
