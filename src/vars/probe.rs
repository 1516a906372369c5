// src/vars/probe.rs

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Runs the commands behind `{ shell = "..." }` variables.
///
/// Variables are resolved once, before any target runs, so this is a plain
/// blocking call.
pub trait CommandProbe: Send + Sync {
    /// Captured stdout of `command` run in `cwd`, or `None` if the command
    /// could not be spawned or exited non-zero.
    fn capture(&self, command: &str, cwd: &Path) -> Option<String>;
}

/// Real probe: `sh -c <command>`, stderr discarded.
#[derive(Debug, Clone, Default)]
pub struct ShellProbe;

impl CommandProbe for ShellProbe {
    fn capture(&self, command: &str, cwd: &Path) -> Option<String> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
                debug!(cmd = %command, stdout = %stdout.trim(), "captured variable command");
                Some(stdout)
            }
            Ok(out) => {
                debug!(cmd = %command, exit_code = ?out.status.code(), "variable command failed");
                None
            }
            Err(e) => {
                warn!(cmd = %command, error = %e, "could not spawn variable command");
                None
            }
        }
    }
}
