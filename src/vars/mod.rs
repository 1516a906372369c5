// src/vars/mod.rs

//! Variable bindings.
//!
//! `[vars]` entries are resolved exactly once, when the graph is loaded, into
//! an immutable [`Bindings`] table. Target outputs, prerequisites and commands
//! are then formatted against that table with `${NAME}` references.
//!
//! - [`resolve`] turns `VarSpec`s (plus `--set` overrides) into `Bindings`.
//! - [`version`] derives a packaging version from `git describe` output.
//! - [`glob`] expands file-list variables.
//! - [`probe`] runs the commands behind `{ shell = "..." }` variables.

pub mod glob;
pub mod probe;
pub mod resolve;
pub mod version;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::errors::{BuildgraphError, Result};

pub use probe::{CommandProbe, ShellProbe};
pub use resolve::{resolve_bindings, ResolveContext};
pub use version::derive_version;

/// Built-in variable holding the project root directory.
pub const ROOT_DIR: &str = "ROOT_DIR";

/// Prefix for process environment lookups: `${env.HOME}`.
pub const ENV_PREFIX: &str = "env.";

/// `${NAME}` reference.
pub(crate) static REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^ }]+)\}").expect("valid reference regex"));

/// One `[vars]` entry.
///
/// ```toml
/// [vars]
/// OUTPUT = "output"
/// SRC_FILES = { glob = ["src/**/*.py"], exclude = ["src/**/_version.py"] }
/// GIT_DESCRIBE = { shell = "git describe --tags", fallback = "" }
/// VERSION = { version = "${GIT_DESCRIBE}" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VarSpec {
    Literal(String),
    Shell {
        shell: String,
        #[serde(default)]
        fallback: Option<String>,
    },
    Glob {
        glob: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    Version {
        version: String,
    },
}

/// Whether a substituted `run_if` / `run_unless` value counts as true.
///
/// Empty text, `0`, `false`, `no` and `off` (any case) are false; anything
/// else is true.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || ["0", "false", "no", "off"]
            .iter()
            .any(|f| value.eq_ignore_ascii_case(f)))
}

/// Resolved variable values. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: BTreeMap<String, String>,
    /// File-list variables, element by element.
    lists: BTreeMap<String, Vec<String>>,
    env: BTreeMap<String, String>,
}

impl Bindings {
    pub(crate) fn new(
        values: BTreeMap<String, String>,
        lists: BTreeMap<String, Vec<String>>,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self { values, lists, env }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every `${NAME}` in `text` with its resolved value.
    ///
    /// Substituted values are not scanned again.
    pub fn substitute(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in REF_PATTERN.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let name = &caps[1];
            let value = self.lookup(name).ok_or_else(|| {
                BuildgraphError::VariableError(format!(
                    "unknown variable '{name}' referenced in \"{text}\""
                ))
            })?;
            out.push_str(&text[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Expand a `deps` / `inputs` entry into paths.
    ///
    /// An entry that is exactly one reference to a file-list variable yields
    /// its files as they are, spaces included. Any other entry is
    /// substituted and split on whitespace.
    pub fn expand_paths(&self, text: &str) -> Result<Vec<String>> {
        let trimmed = text.trim();
        if let Some(caps) = REF_PATTERN.captures(trimmed) {
            let whole_entry = caps.get(0).is_some_and(|m| m.len() == trimmed.len());
            if let Some(files) = self.lists.get(&caps[1]).filter(|_| whole_entry) {
                return Ok(files.clone());
            }
        }

        Ok(self
            .substitute(text)?
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name.strip_prefix(ENV_PREFIX) {
            Some(env_name) => self.env.get(env_name).map(String::as_str),
            None => self.get(name),
        }
    }
}
