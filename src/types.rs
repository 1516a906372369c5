// src/types.rs

/// Name of a target as written in `[[target]] name = "..."`.
pub type TargetName = String;

/// Result of running a single shell command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit. `128 + N` when killed by signal N, `-1` when the
    /// shell could not be spawned at all.
    Failed(i32),
}

impl CommandOutcome {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            CommandOutcome::Success
        } else {
            CommandOutcome::Failed(code)
        }
    }
}
