// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildgraph",
    version,
    about = "Run shell commands over a target graph, skipping up-to-date targets.",
    long_about = None
)]
pub struct CliArgs {
    /// Targets to build, in order. Defaults to `[config].default` or the
    /// first declared target.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Path to the config file (TOML).
    #[arg(short = 'f', long = "file", value_name = "PATH", default_value = "Buildgraph.toml")]
    pub config: String,

    /// Override a variable: `--set VERSION=1.0.0`. May be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,

    /// Print what would run and why, without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// List targets with their descriptions.
    #[arg(long)]
    pub list: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_overrides() {
        let args = CliArgs::parse_from([
            "buildgraph",
            "-f",
            "demo/Buildgraph.toml",
            "--set",
            "VENV=.venv",
            "--set",
            "OUTPUT=out",
            "clean-venv",
            "build",
        ]);

        assert_eq!(args.config, "demo/Buildgraph.toml");
        assert_eq!(args.overrides, vec!["VENV=.venv", "OUTPUT=out"]);
        assert_eq!(args.targets, vec!["clean-venv", "build"]);
        assert!(!args.dry_run);
    }

    #[test]
    fn defaults() {
        let args = CliArgs::parse_from(["buildgraph"]);
        assert_eq!(args.config, "Buildgraph.toml");
        assert!(args.targets.is_empty());
        assert!(args.log_level.is_none());
    }
}
