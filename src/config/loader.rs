// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildgraphError, Result};

/// Deserialize TOML text and run structural validation.
///
/// - Applies defaults (handled by `serde`).
/// - Checks for:
///   - an empty target table,
///   - empty or duplicate target names,
///   - unknown `[config] default`, `append_to` and `prepend_to` references.
///
/// Cycles and missing prerequisite files are only detectable once variables
/// are substituted; [`crate::dag::TargetGraph::build`] reports those.
pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    let raw_config: RawConfigFile = toml::from_str(contents)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Read a configuration file from disk and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), "loaded config file");
    parse_config(&contents)
}

/// Parse a `--set NAME=VALUE` override.
pub fn parse_override(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(BuildgraphError::ConfigError(format!(
            "variable override is not a NAME=VALUE string: {s}"
        ))),
    }
}
