// src/logging.rs

//! `tracing` setup for the `buildgraph` binary.
//!
//! The level comes from `--log-level`, else from `BUILDGRAPH_LOG`
//! (`error`, `warn`, `info`, `debug`, `trace`, case-insensitive), else WARN.
//! Everything is written to stderr; stdout carries echoed commands and the
//! commands' own output.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "BUILDGRAPH_LOG";

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Install the global subscriber. Call once, before loading the config.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let level = effective_level(cli_level, env_level.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn effective_level(cli_level: Option<LogLevel>, env_level: Option<&str>) -> Level {
    match cli_level {
        Some(lvl) => lvl.into(),
        None => env_level
            .and_then(|s| s.trim().parse::<Level>().ok())
            .unwrap_or(Level::WARN),
    }
}
