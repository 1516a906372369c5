// src/vars/resolve.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::errors::{BuildgraphError, Result};
use crate::fs::FileSystem;
use crate::vars::glob::collect_matching_files;
use crate::vars::probe::CommandProbe;
use crate::vars::version::derive_version;
use crate::vars::{Bindings, VarSpec, ENV_PREFIX, REF_PATTERN, ROOT_DIR};

/// Everything variable resolution may touch.
pub struct ResolveContext<'a> {
    /// Project root: cwd for shell variables, base for glob variables.
    pub root: PathBuf,
    pub fs: &'a dyn FileSystem,
    pub probe: &'a dyn CommandProbe,
    /// Snapshot of the process environment for `${env.NAME}`.
    pub env: BTreeMap<String, String>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(root: PathBuf, fs: &'a dyn FileSystem, probe: &'a dyn CommandProbe) -> Self {
        Self {
            root,
            fs,
            probe,
            env: std::env::vars().collect(),
        }
    }

    /// Replace the environment snapshot.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

/// Resolve all `[vars]` into an immutable [`Bindings`] table.
///
/// `overrides` (from `--set NAME=VALUE`) replace the spec of the same name
/// with a literal before anything is resolved. `ROOT_DIR` is predefined
/// unless the config defines it.
pub fn resolve_bindings(
    specs: &BTreeMap<String, VarSpec>,
    overrides: &[(String, String)],
    ctx: &ResolveContext<'_>,
) -> Result<Bindings> {
    let mut all_specs = BTreeMap::new();
    all_specs.insert(
        ROOT_DIR.to_string(),
        VarSpec::Literal(ctx.root.to_string_lossy().into_owned()),
    );
    all_specs.extend(specs.iter().map(|(k, v)| (k.clone(), v.clone())));

    for (name, value) in overrides {
        debug!(var = %name, value = %value, "overriding variable from command line");
        all_specs.insert(name.clone(), VarSpec::Literal(value.clone()));
    }

    let mut resolver = Resolver {
        specs: &all_specs,
        ctx,
        cache: BTreeMap::new(),
        lists: BTreeMap::new(),
        resolving: Vec::new(),
    };

    for name in all_specs.keys() {
        resolver.resolve(name)?;
    }

    info!(count = resolver.cache.len(), "resolved variables");
    Ok(Bindings::new(resolver.cache, resolver.lists, ctx.env.clone()))
}

struct Resolver<'s, 'c> {
    specs: &'s BTreeMap<String, VarSpec>,
    ctx: &'s ResolveContext<'c>,
    cache: BTreeMap<String, String>,
    /// Glob results, kept unjoined for prerequisite lists.
    lists: BTreeMap<String, Vec<String>>,
    /// Names currently being resolved, innermost last.
    resolving: Vec<String>,
}

impl Resolver<'_, '_> {
    fn resolve(&mut self, name: &str) -> Result<String> {
        if let Some(value) = self.cache.get(name) {
            return Ok(value.clone());
        }

        if self.resolving.iter().any(|n| n == name) {
            let from = self.resolving.last().cloned().unwrap_or_default();
            return Err(BuildgraphError::VariableError(format!(
                "cyclic substitution: resolving '{name}' again from '{from}'"
            )));
        }

        let specs = self.specs;
        let spec = specs.get(name).ok_or_else(|| {
            let from = self.resolving.last().cloned().unwrap_or_default();
            BuildgraphError::VariableError(format!(
                "unknown variable '{name}' referenced from '{from}'"
            ))
        })?;

        self.resolving.push(name.to_string());
        let value = self.evaluate(name, spec);
        self.resolving.pop();
        let value = value?;

        debug!(var = %name, value = %value, "resolved variable");
        self.cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn evaluate(&mut self, name: &str, spec: &VarSpec) -> Result<String> {
        match spec {
            VarSpec::Literal(text) => self.expand(text),
            VarSpec::Shell { shell, fallback } => {
                let cmd = self.expand(shell)?;
                match self.ctx.probe.capture(&cmd, &self.ctx.root) {
                    Some(stdout) => Ok(stdout.trim().to_string()),
                    None => match fallback {
                        Some(text) => self.expand(text),
                        None => Err(BuildgraphError::VariableError(format!(
                            "command for variable '{name}' failed and no fallback is set: {cmd}"
                        ))),
                    },
                }
            }
            VarSpec::Glob { glob, exclude } => {
                let patterns = self.expand_all(glob)?;
                let excludes = self.expand_all(exclude)?;
                let files =
                    collect_matching_files(self.ctx.fs, &self.ctx.root, &patterns, &excludes)?;
                let joined = files.join(" ");
                self.lists.insert(name.to_string(), files);
                Ok(joined)
            }
            VarSpec::Version { version } => {
                let text = self.expand(version)?;
                Ok(derive_version(Some(&text)))
            }
        }
    }

    fn expand_all(&mut self, items: &[String]) -> Result<Vec<String>> {
        items.iter().map(|s| self.expand(s)).collect()
    }

    /// Substitute `${...}` references inside a spec's own text.
    fn expand(&mut self, text: &str) -> Result<String> {
        let refs: Vec<(usize, usize, String)> = REF_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end(), caps[1].to_string()))
            })
            .collect();

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (start, end, reference) in refs {
            let value = match reference.strip_prefix(ENV_PREFIX) {
                Some(env_name) => self.ctx.env.get(env_name).cloned().ok_or_else(|| {
                    BuildgraphError::VariableError(format!(
                        "environment variable '{env_name}' is not set"
                    ))
                })?,
                None => self.resolve(&reference)?,
            };
            out.push_str(&text[last..start]);
            out.push_str(&value);
            last = end;
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::path::Path;

    struct NoProbe;

    impl CommandProbe for NoProbe {
        fn capture(&self, _command: &str, _cwd: &Path) -> Option<String> {
            None
        }
    }

    fn specs(entries: &[(&str, VarSpec)]) -> BTreeMap<String, VarSpec> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn lit(s: &str) -> VarSpec {
        VarSpec::Literal(s.to_string())
    }

    #[test]
    fn nested_references_resolve_once() {
        let fs = MockFileSystem::new();
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[
            ("OUTPUT", lit("output")),
            ("ARTIFACTS", lit("${OUTPUT}/artifacts")),
            ("DIST", lit("${ARTIFACTS}/pkg.tar.gz")),
        ]);

        let b = resolve_bindings(&vars, &[], &ctx).unwrap();
        assert_eq!(b.get("DIST"), Some("output/artifacts/pkg.tar.gz"));
        assert_eq!(b.get(ROOT_DIR), Some("."));
    }

    #[test]
    fn cyclic_reference_is_rejected() {
        let fs = MockFileSystem::new();
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[("A", lit("${B}")), ("B", lit("x${A}"))]);

        let err = resolve_bindings(&vars, &[], &ctx).unwrap_err();
        assert!(matches!(err, BuildgraphError::VariableError(msg) if msg.contains("cyclic")));
    }

    #[test]
    fn failing_shell_uses_fallback_then_version_default() {
        let fs = MockFileSystem::new();
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[
            (
                "GIT_DESCRIBE",
                VarSpec::Shell {
                    shell: "git describe --tags".to_string(),
                    fallback: Some(String::new()),
                },
            ),
            (
                "VERSION",
                VarSpec::Version {
                    version: "${GIT_DESCRIBE}".to_string(),
                },
            ),
        ]);

        let b = resolve_bindings(&vars, &[], &ctx).unwrap();
        assert_eq!(b.get("VERSION"), Some("0.0.0"));
    }

    #[test]
    fn failing_shell_without_fallback_is_an_error() {
        let fs = MockFileSystem::new();
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[(
            "X",
            VarSpec::Shell {
                shell: "false".to_string(),
                fallback: None,
            },
        )]);

        assert!(matches!(
            resolve_bindings(&vars, &[], &ctx),
            Err(BuildgraphError::VariableError(_))
        ));
    }

    #[test]
    fn overrides_replace_specs() {
        let fs = MockFileSystem::new();
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[("VENV", lit("venv")), ("PIP", lit("${VENV}/bin/pip"))]);
        let overrides = vec![("VENV".to_string(), ".venv".to_string())];

        let b = resolve_bindings(&vars, &overrides, &ctx).unwrap();
        assert_eq!(b.get("PIP"), Some(".venv/bin/pip"));
    }

    #[test]
    fn glob_variable_keeps_file_list() {
        let fs = MockFileSystem::new();
        fs.add_file("src/my mod.py", "");
        fs.add_file("src/util.py", "");
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[(
            "SRC",
            VarSpec::Glob {
                glob: vec!["src/*.py".to_string()],
                exclude: Vec::new(),
            },
        )]);

        let b = resolve_bindings(&vars, &[], &ctx).unwrap();
        assert_eq!(b.get("SRC"), Some("src/my mod.py src/util.py"));
        assert_eq!(
            b.expand_paths("${SRC}").unwrap(),
            vec!["src/my mod.py", "src/util.py"]
        );
    }

    #[test]
    fn missing_environment_variable_is_an_error() {
        let fs = MockFileSystem::new();
        let ctx = ResolveContext::new(PathBuf::from("."), &fs, &NoProbe).with_env(BTreeMap::new());
        let vars = specs(&[("PY", lit("${env.PYTHON}"))]);

        assert!(resolve_bindings(&vars, &[], &ctx).is_err());
    }
}
