#![allow(dead_code)]

use std::collections::BTreeMap;

use buildgraph::config::{
    Condition, ConfigFile, ConfigSection, RawConfigFile, TargetConfig, TargetRef,
};
use buildgraph::vars::VarSpec;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                vars: BTreeMap::new(),
                target: Vec::new(),
            },
        }
    }

    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.config.target.push(target);
        self
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.config
            .vars
            .insert(name.to_string(), VarSpec::Literal(value.to_string()));
        self
    }

    pub fn with_var_spec(mut self, name: &str, spec: VarSpec) -> Self {
        self.config.vars.insert(name.to_string(), spec);
        self
    }

    pub fn with_default(mut self, target: &str) -> Self {
        self.config.config.default = Some(target.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            target: TargetConfig::new(name),
        }
    }

    pub fn output(mut self, path: &str) -> Self {
        self.target.output = Some(path.to_string());
        self
    }

    /// Adds to `outputs`, alongside any `output`.
    pub fn outputs(mut self, paths: &[&str]) -> Self {
        self.target
            .outputs
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn input(mut self, path: &str) -> Self {
        self.target.inputs.push(path.to_string());
        self
    }

    pub fn run_if(mut self, expr: &str) -> Self {
        self.target.run_if = Some(Condition::Expr(expr.to_string()));
        self
    }

    pub fn run_unless(mut self, expr: &str) -> Self {
        self.target.run_unless = Some(Condition::Expr(expr.to_string()));
        self
    }

    pub fn dep(mut self, dep: &str) -> Self {
        self.target.deps.push(dep.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.target.cmds.push(cmd.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.target.description = Some(text.to_string());
        self
    }

    pub fn silent(mut self, val: bool) -> Self {
        self.target.silent = val;
        self
    }

    pub fn append_to(mut self, target: &str) -> Self {
        self.target.append_to = Some(TargetRef::One(target.to_string()));
        self
    }

    pub fn prepend_to(mut self, target: &str) -> Self {
        self.target.prepend_to = Some(TargetRef::One(target.to_string()));
        self
    }

    /// `append_to` with candidates; the first existing target is used.
    pub fn append_to_first_of(mut self, candidates: &[&str]) -> Self {
        self.target.append_to = Some(TargetRef::FirstOf(
            candidates.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}
