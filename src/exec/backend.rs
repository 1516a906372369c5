// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runner talks to an `ExecutorBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`super::command`].

use std::future::Future;
use std::pin::Pin;

use tracing::error;

use crate::errors::Result;
use crate::types::CommandOutcome;

use super::command::{run_shell_command, ScheduledCommand};

/// Trait abstracting how commands are executed.
///
/// The runner awaits each returned future before dispatching the next
/// command, so implementations never see two commands at once.
pub trait ExecutorBackend: Send {
    fn run_command(
        &mut self,
        cmd: ScheduledCommand,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + '_>>;
}

/// Real executor backend used in production: one `sh -c` per command.
#[derive(Debug, Clone, Default)]
pub struct RealExecutorBackend;

impl RealExecutorBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn run_command(
        &mut self,
        cmd: ScheduledCommand,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + '_>> {
        Box::pin(async move {
            match run_shell_command(&cmd).await {
                Ok(outcome) => Ok(outcome),
                Err(err) => {
                    // Could not even start the shell: report as a failed command.
                    error!(target_name = %cmd.target, error = %err, "command execution error");
                    Ok(CommandOutcome::Failed(-1))
                }
            }
        })
    }
}
