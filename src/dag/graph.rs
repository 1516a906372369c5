// src/dag/graph.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::model::{Condition, ConfigFile, TargetRef};
use crate::errors::{BuildgraphError, Result};
use crate::types::TargetName;
use crate::vars::{is_truthy, Bindings};

/// A resolved prerequisite of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    /// Another target, by index into [`TargetGraph::nodes`].
    Target(usize),
    /// A plain file (relative to the project root) that no target produces.
    File(PathBuf),
}

/// A target with every `${VAR}` substituted.
#[derive(Debug, Clone)]
pub struct TargetNode {
    pub name: TargetName,
    /// Output paths relative to the project root; empty for phony targets.
    pub outputs: Vec<PathBuf>,
    pub prerequisites: Vec<Prerequisite>,
    pub commands: Vec<String>,
    pub description: Option<String>,
    pub silent: bool,
    /// `false` when `run_if` / `run_unless` rule the target out. Disabled
    /// targets are never executed.
    pub enabled: bool,
}

/// The target table, in declaration order, with prerequisites resolved to
/// indices. Guaranteed acyclic once built.
#[derive(Debug, Clone)]
pub struct TargetGraph {
    nodes: Vec<TargetNode>,
    index: HashMap<TargetName, usize>,
    root: PathBuf,
    default_target: TargetName,
}

/// Strip `./` prefixes and trailing slashes so `./venv/` and `venv` compare
/// equal when matching prerequisites against outputs.
fn normalize_path_str(s: &str) -> String {
    let mut s = s.trim();
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s.trim_end_matches('/').to_string()
}

/// Raw prerequisite entries of one target, after substitution.
struct PendingDeps {
    /// Matched against target names, then outputs.
    deps: Vec<String>,
    /// Matched against outputs only.
    inputs: Vec<String>,
}

impl TargetGraph {
    /// Build the graph from a validated [`ConfigFile`].
    ///
    /// - substitutes variables into outputs, prerequisites, commands and
    ///   run conditions,
    /// - rejects an output path declared by two targets,
    /// - resolves each `deps` entry to a target (by name, then by output
    ///   path) or to a plain file, and each `inputs` entry by output path or
    ///   to a plain file,
    /// - applies `append_to` / `prepend_to` contributions,
    /// - rejects self-dependencies and cycles.
    pub fn build(cfg: &ConfigFile, bindings: &Bindings, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let mut index = HashMap::new();
        let mut outputs: HashMap<String, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(cfg.targets().len());
        let mut pending = Vec::with_capacity(cfg.targets().len());

        // First pass: substitute everything and index names and outputs.
        for (idx, tc) in cfg.targets().iter().enumerate() {
            let mut own_outputs = Vec::new();
            for raw in tc.output.iter().chain(tc.outputs.iter()) {
                let out = normalize_path_str(&bindings.substitute(raw)?);
                if out.is_empty() {
                    return Err(BuildgraphError::ConfigError(format!(
                        "target '{}' has an empty output after substitution",
                        tc.name
                    )));
                }
                match outputs.get(&out) {
                    Some(&owner) if owner != idx => {
                        return Err(BuildgraphError::ConfigError(format!(
                            "output '{}' is declared by both target '{}' and target '{}'",
                            out,
                            cfg.targets()[owner].name,
                            tc.name
                        )));
                    }
                    Some(_) => continue,
                    None => {
                        outputs.insert(out.clone(), idx);
                        own_outputs.push(PathBuf::from(out));
                    }
                }
            }

            let mut deps = Vec::new();
            for raw in tc.deps.iter() {
                deps.extend(bindings.expand_paths(raw)?);
            }
            let mut inputs = Vec::new();
            for raw in tc.inputs.iter() {
                inputs.extend(bindings.expand_paths(raw)?);
            }
            pending.push(PendingDeps { deps, inputs });

            let commands = tc
                .cmds
                .iter()
                .map(|c| bindings.substitute(c))
                .collect::<Result<Vec<_>>>()?;

            let enabled = condition_holds(tc.run_if.as_ref(), bindings, true)?
                && !condition_holds(tc.run_unless.as_ref(), bindings, false)?;
            if !enabled {
                debug!(target_name = %tc.name, "target disabled by its run condition");
            }

            index.insert(tc.name.clone(), idx);
            nodes.push(TargetNode {
                name: tc.name.clone(),
                outputs: own_outputs,
                prerequisites: Vec::new(),
                commands,
                description: tc.description.clone(),
                silent: tc.silent,
                enabled,
            });
        }

        // Second pass: classify prerequisites.
        for (idx, PendingDeps { deps, inputs }) in pending.into_iter().enumerate() {
            let by_name = deps.into_iter().map(|d| (d, true));
            let by_output = inputs.into_iter().map(|i| (i, false));

            let mut prerequisites = Vec::new();
            for (entry, match_names) in by_name.chain(by_output) {
                let named = if match_names { index.get(&entry) } else { None };
                let prereq = match named.or_else(|| outputs.get(&normalize_path_str(&entry))) {
                    Some(&target) => Prerequisite::Target(target),
                    None => Prerequisite::File(PathBuf::from(entry)),
                };

                if prereq == Prerequisite::Target(idx) {
                    return Err(BuildgraphError::ConfigError(format!(
                        "target '{}' cannot depend on itself",
                        nodes[idx].name
                    )));
                }
                if !prerequisites.contains(&prereq) {
                    prerequisites.push(prereq);
                }
            }
            nodes[idx].prerequisites = prerequisites;
        }

        // Third pass: contributions into other targets' prerequisites.
        for (idx, tc) in cfg.targets().iter().enumerate() {
            if let Some(ref dest) = tc.append_to {
                let dest = lookup(&index, dest)?;
                let prereqs = &mut nodes[dest].prerequisites;
                if !prereqs.contains(&Prerequisite::Target(idx)) {
                    prereqs.push(Prerequisite::Target(idx));
                }
            }
            if let Some(ref dest) = tc.prepend_to {
                let dest = lookup(&index, dest)?;
                let prereqs = &mut nodes[dest].prerequisites;
                if !prereqs.contains(&Prerequisite::Target(idx)) {
                    prereqs.insert(0, Prerequisite::Target(idx));
                }
            }
        }

        let graph = Self {
            nodes,
            index,
            root,
            default_target: cfg.default_target().to_string(),
        };
        graph.ensure_acyclic()?;

        debug!(targets = graph.nodes.len(), "target graph built");
        Ok(graph)
    }

    fn ensure_acyclic(&self) -> Result<()> {
        // Edge direction: prerequisite -> dependent.
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();

        for idx in 0..self.nodes.len() {
            graph.add_node(idx);
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            for prereq in node.prerequisites.iter() {
                if let Prerequisite::Target(dep) = prereq {
                    graph.add_edge(*dep, idx, ());
                }
            }
        }

        // A topological sort will fail if there is a cycle.
        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = cycle.node_id();
                Err(BuildgraphError::DagCycle(format!(
                    "target '{}' depends on itself through its prerequisites",
                    self.nodes[node].name
                )))
            }
        }
    }

    /// All targets in declaration order.
    pub fn nodes(&self) -> &[TargetNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &TargetNode {
        &self.nodes[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&TargetNode> {
        self.index_of(name).map(|idx| &self.nodes[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Directory commands run in and relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }

    /// Output paths of a target joined onto the project root.
    pub fn output_paths(&self, idx: usize) -> Vec<PathBuf> {
        self.nodes[idx]
            .outputs
            .iter()
            .map(|out| self.root.join(out))
            .collect()
    }

    /// Human-readable prerequisite names of a target.
    pub fn prerequisite_names(&self, idx: usize) -> Vec<String> {
        self.nodes[idx]
            .prerequisites
            .iter()
            .map(|p| match p {
                Prerequisite::Target(dep) => self.nodes[*dep].name.clone(),
                Prerequisite::File(path) => path.to_string_lossy().into_owned(),
            })
            .collect()
    }
}

fn condition_holds(cond: Option<&Condition>, bindings: &Bindings, absent: bool) -> Result<bool> {
    match cond {
        None => Ok(absent),
        Some(Condition::Flag(flag)) => Ok(*flag),
        Some(Condition::Expr(text)) => Ok(is_truthy(&bindings.substitute(text)?)),
    }
}

fn lookup(index: &HashMap<TargetName, usize>, dest: &TargetRef) -> Result<usize> {
    dest.resolve(|name| index.contains_key(name))
        .and_then(|name| index.get(name).copied())
        .ok_or_else(|| BuildgraphError::UnknownTarget(dest.candidates().join(" | ")))
}
