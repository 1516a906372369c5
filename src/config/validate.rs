// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildgraphError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildgraphError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.vars, raw.target))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_targets(cfg)?;
    validate_target_names(cfg)?;
    validate_default_target(cfg)?;
    validate_contributions(cfg)?;
    Ok(())
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.target.is_empty() {
        return Err(BuildgraphError::ConfigError(
            "config must contain at least one [[target]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_target_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for target in cfg.target.iter() {
        if target.name.trim().is_empty() {
            return Err(BuildgraphError::ConfigError(
                "target name must not be empty".to_string(),
            ));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(BuildgraphError::ConfigError(format!(
                "target '{}' is declared more than once",
                target.name
            )));
        }
    }
    Ok(())
}

fn validate_default_target(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ref default) = cfg.config.default {
        if !cfg.target.iter().any(|t| &t.name == default) {
            return Err(BuildgraphError::ConfigError(format!(
                "[config].default names unknown target '{}'",
                default
            )));
        }
    }
    Ok(())
}

fn validate_contributions(cfg: &RawConfigFile) -> Result<()> {
    let known = |name: &str| cfg.target.iter().any(|t| t.name == name);

    for target in cfg.target.iter() {
        let contributions = [
            ("append_to", target.append_to.as_ref()),
            ("prepend_to", target.prepend_to.as_ref()),
        ];
        for (field, dest) in contributions {
            let Some(dest) = dest else { continue };
            let Some(resolved) = dest.resolve(known) else {
                return Err(BuildgraphError::ConfigError(format!(
                    "target '{}' has no known target among {:?} in `{}`",
                    target.name,
                    dest.candidates(),
                    field
                )));
            };
            if resolved == target.name {
                return Err(BuildgraphError::ConfigError(format!(
                    "target '{}' cannot contribute to itself in `{}`",
                    target.name, field
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{ConfigSection, TargetConfig, TargetRef};
    use std::collections::BTreeMap;

    fn raw(targets: Vec<TargetConfig>) -> RawConfigFile {
        RawConfigFile {
            config: ConfigSection::default(),
            vars: BTreeMap::new(),
            target: targets,
        }
    }

    fn contributing(name: &str, candidates: &[&str]) -> TargetConfig {
        let mut t = TargetConfig::new(name);
        t.append_to = Some(TargetRef::FirstOf(
            candidates.iter().map(|c| c.to_string()).collect(),
        ));
        t
    }

    #[test]
    fn first_known_candidate_is_accepted() {
        let cfg = raw(vec![TargetConfig::new("build"), contributing("lint", &["tests", "build"])]);
        assert!(ConfigFile::try_from(cfg).is_ok());
    }

    #[test]
    fn no_known_candidate_is_rejected() {
        let cfg = raw(vec![TargetConfig::new("build"), contributing("lint", &["tests", "check"])]);
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(matches!(err, BuildgraphError::ConfigError(msg) if msg.contains("tests") && msg.contains("check")));
    }

    #[test]
    fn resolving_to_self_is_rejected() {
        let cfg = raw(vec![TargetConfig::new("build"), contributing("lint", &["lint", "build"])]);
        let err = ConfigFile::try_from(cfg).unwrap_err();
        assert!(matches!(err, BuildgraphError::ConfigError(msg) if msg.contains("itself")));
    }
}
