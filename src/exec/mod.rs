// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] runs a single command with `tokio::process::Command`.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production, which tests replace with a
//!   fake implementation.

pub mod backend;
pub mod command;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use command::{run_shell_command, ScheduledCommand};
