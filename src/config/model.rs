// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::vars::VarSpec;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// default = "build"
///
/// [vars]
/// VENV = "venv"
/// SRC_FILES = { glob = ["src/**/*.py"] }
///
/// [[target]]
/// name = "venv"
/// output = "${VENV}"
/// deps = ["requirements.txt"]
/// cmds = ["python3 -m venv ${VENV}"]
/// ```
///
/// Targets are an array of tables so that declaration order survives
/// deserialization; it is used to break ties in the topological order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub vars: BTreeMap<String, VarSpec>,

    #[serde(default)]
    pub target: Vec<TargetConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    vars: BTreeMap<String, VarSpec>,
    targets: Vec<TargetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        vars: BTreeMap<String, VarSpec>,
        targets: Vec<TargetConfig>,
    ) -> Self {
        Self {
            config,
            vars,
            targets,
        }
    }

    pub fn vars(&self) -> &BTreeMap<String, VarSpec> {
        &self.vars
    }

    /// Targets in declaration order.
    pub fn targets(&self) -> &[TargetConfig] {
        &self.targets
    }

    /// Target used when none is requested: `[config] default`, or the first
    /// declared target.
    pub fn default_target(&self) -> &str {
        match self.config.default {
            Some(ref name) => name,
            None => &self.targets[0].name,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Target to run when none is given on the command line.
    #[serde(default)]
    pub default: Option<String>,
}

/// One `[[target]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub name: String,

    /// Output file path, relative to the project root. A target with no
    /// `output` and no `outputs` is phony (always run).
    #[serde(default)]
    pub output: Option<String>,

    /// Further output files. The target is stale if any of them is missing
    /// or older than a prerequisite.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Prerequisites: target names, target output paths or plain files.
    /// Entries may use `${VAR}`; the substituted text is split on whitespace,
    /// except an entry that is exactly one file-list variable.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Input files: like `deps`, but never matched against target names.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Shell commands, run in order with `sh -c`.
    #[serde(default)]
    pub cmds: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Do not echo commands before running them.
    #[serde(default)]
    pub silent: bool,

    /// Only run when this condition holds.
    #[serde(default)]
    pub run_if: Option<Condition>,

    /// Never run when this condition holds.
    #[serde(default)]
    pub run_unless: Option<Condition>,

    /// Add this target at the end of another target's `deps`.
    #[serde(default)]
    pub append_to: Option<TargetRef>,

    /// Add this target at the start of another target's `deps`.
    #[serde(default)]
    pub prepend_to: Option<TargetRef>,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: None,
            outputs: Vec::new(),
            deps: Vec::new(),
            inputs: Vec::new(),
            cmds: Vec::new(),
            description: None,
            silent: false,
            run_if: None,
            run_unless: None,
            append_to: None,
            prepend_to: None,
        }
    }
}

/// `run_if` / `run_unless` value: a literal flag, or text evaluated after
/// variable substitution (see [`crate::vars::is_truthy`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Flag(bool),
    Expr(String),
}

/// Contribution destination: one target name, or candidates of which the
/// first declared one is used.
///
/// ```toml
/// append_to = "build"
/// prepend_to = ["tests", "build"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    One(String),
    FirstOf(Vec<String>),
}

impl TargetRef {
    pub fn candidates(&self) -> &[String] {
        match self {
            TargetRef::One(name) => std::slice::from_ref(name),
            TargetRef::FirstOf(names) => names,
        }
    }

    /// First candidate for which `known` holds.
    pub fn resolve(&self, known: impl Fn(&str) -> bool) -> Option<&str> {
        self.candidates()
            .iter()
            .map(String::as_str)
            .find(|name| known(name))
    }
}
