// src/config/mod.rs

//! Configuration loading and validation for buildgraph.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate structural invariants like unique target names (`validate.rs`).
//!
//! Graph-level checks that need substituted values (cycles, missing
//! prerequisite files) live in [`crate::dag`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, parse_config, parse_override};
pub use model::{Condition, ConfigFile, ConfigSection, RawConfigFile, TargetConfig, TargetRef};
