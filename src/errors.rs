// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Configuration problems (bad TOML, unknown targets, cycles, missing
//! prerequisite files, unresolvable variables) are all detected before any
//! command runs. A command exiting non-zero is *not* an error: it is reported
//! as a [`crate::engine::RunOutcome`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildgraphError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Cycle detected in target graph: {0}")]
    DagCycle(String),

    #[error("No rule to make '{path}', needed by target '{needed_by}'")]
    NoRule { path: String, needed_by: String },

    #[error("Variable error: {0}")]
    VariableError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildgraphError>;
