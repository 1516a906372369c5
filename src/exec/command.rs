// src/exec/command.rs

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::types::{CommandOutcome, TargetName};

/// A single shell command belonging to a target, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCommand {
    pub target: TargetName,
    /// Command text with any leading `@` already stripped.
    pub command: String,
    pub cwd: PathBuf,
    /// Print the command before running it.
    pub echo: bool,
}

impl ScheduledCommand {
    /// Build from a raw command line. A leading `@` suppresses echoing.
    pub fn new(target: impl Into<TargetName>, raw: &str, cwd: PathBuf, silent: bool) -> Self {
        let (command, quiet) = match raw.trim_start().strip_prefix('@') {
            Some(rest) => (rest.trim_start().to_string(), true),
            None => (raw.to_string(), false),
        };
        Self {
            target: target.into(),
            command,
            cwd,
            echo: !(silent || quiet),
        }
    }
}

/// Run one command through the platform shell and wait for it.
///
/// stdout/stderr are inherited: the tool's own output is the only
/// diagnostic a failing command produces.
pub async fn run_shell_command(cmd: &ScheduledCommand) -> Result<CommandOutcome> {
    if cmd.echo {
        println!("{}", cmd.command);
    }

    info!(target_name = %cmd.target, cmd = %cmd.command, "running command");

    // Build a shell command appropriate for the platform.
    let mut process = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&cmd.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&cmd.command);
        c
    };

    process
        .current_dir(&cmd.cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let status = process
        .status()
        .await
        .with_context(|| format!("spawning shell for target '{}'", cmd.target))?;

    let code = exit_code(status);
    debug!(
        target_name = %cmd.target,
        exit_code = code,
        success = status.success(),
        "command exited"
    );

    Ok(CommandOutcome::from_exit_code(code))
}

/// Exit code as a shell reports it: `128 + N` for a process killed by
/// signal N.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_prefix_disables_echo() {
        let cmd = ScheduledCommand::new("venv", "@ mkdir -p out", PathBuf::from("."), false);
        assert_eq!(cmd.command, "mkdir -p out");
        assert!(!cmd.echo);

        let cmd = ScheduledCommand::new("venv", "mkdir -p out", PathBuf::from("."), false);
        assert!(cmd.echo);

        let cmd = ScheduledCommand::new("venv", "mkdir -p out", PathBuf::from("."), true);
        assert!(!cmd.echo);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_code_is_reported() {
        let dir = std::env::temp_dir();
        let ok = ScheduledCommand::new("t", "@true", dir.clone(), true);
        let bad = ScheduledCommand::new("t", "@exit 3", dir, true);

        assert_eq!(run_shell_command(&ok).await.unwrap(), CommandOutcome::Success);
        assert_eq!(run_shell_command(&bad).await.unwrap(), CommandOutcome::Failed(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn killed_command_reports_128_plus_signal() {
        let cmd = ScheduledCommand::new("t", "@kill -9 $$", std::env::temp_dir(), true);

        assert_eq!(run_shell_command(&cmd).await.unwrap(), CommandOutcome::Failed(137));
    }
}
