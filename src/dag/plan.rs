// src/dag/plan.rs

//! Pure build planning: which targets need to run, and in what order.
//!
//! Nothing here spawns processes. Filesystem access is limited to
//! modification-time lookups through [`FileSystem::modified`], so a plan can
//! be computed against a [`crate::fs::mock::MockFileSystem`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;

use crate::dag::graph::{Prerequisite, TargetGraph};
use crate::errors::{BuildgraphError, Result};
use crate::fs::FileSystem;
use crate::types::TargetName;

/// Why a target has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReason {
    /// No output file: always runs.
    Phony,
    OutputMissing,
    /// The named prerequisite's file is newer than this target's output.
    PrerequisiteNewer(String),
    /// The named prerequisite target runs (or already ran) in this invocation.
    PrerequisiteRebuilt(String),
}

impl fmt::Display for RunReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReason::Phony => write!(f, "phony target"),
            RunReason::OutputMissing => write!(f, "output missing"),
            RunReason::PrerequisiteNewer(name) => write!(f, "'{name}' is newer"),
            RunReason::PrerequisiteRebuilt(name) => write!(f, "'{name}' is rebuilt"),
        }
    }
}

/// State of a target's own outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Phony,
    /// At least one output does not exist.
    Missing,
    /// Every output exists; holds the oldest modification time.
    Present(SystemTime),
}

impl OutputState {
    /// Look up `outputs` through `fs`.
    pub fn of(fs: &dyn FileSystem, outputs: &[PathBuf]) -> Self {
        let mut oldest: Option<SystemTime> = None;
        for path in outputs {
            match fs.modified(path) {
                Some(t) => oldest = Some(oldest.map_or(t, |o| o.min(t))),
                None => return OutputState::Missing,
            }
        }
        match oldest {
            Some(t) => OutputState::Present(t),
            None => OutputState::Phony,
        }
    }
}

/// What the staleness check needs to know about one prerequisite.
#[derive(Debug, Clone)]
pub struct PrerequisiteState<'a> {
    pub name: &'a str,
    /// Modification time of the prerequisite's file, if it has one.
    pub modified: Option<SystemTime>,
    /// Whether the prerequisite target runs in this invocation.
    pub requires_run: bool,
}

/// Staleness predicate. Returns the first reason found, or `None` when the
/// target is up to date. A prerequisite with the *same* timestamp as the
/// output does not make it stale.
pub fn staleness(own: OutputState, prereqs: &[PrerequisiteState<'_>]) -> Option<RunReason> {
    let own_time = match own {
        OutputState::Phony => return Some(RunReason::Phony),
        OutputState::Missing => return Some(RunReason::OutputMissing),
        OutputState::Present(t) => t,
    };

    for prereq in prereqs {
        if prereq.requires_run {
            return Some(RunReason::PrerequisiteRebuilt(prereq.name.to_string()));
        }
        if prereq.modified.is_some_and(|t| t > own_time) {
            return Some(RunReason::PrerequisiteNewer(prereq.name.to_string()));
        }
    }

    None
}

/// Every target reachable from `root` through target prerequisites,
/// including `root` itself.
pub fn closure(graph: &TargetGraph, root: usize) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];

    while let Some(idx) = stack.pop() {
        if !seen.insert(idx) {
            continue;
        }
        for prereq in graph.node(idx).prerequisites.iter() {
            if let Prerequisite::Target(dep) = prereq {
                stack.push(*dep);
            }
        }
    }

    seen
}

/// Topological order of `closure(graph, root)`: every prerequisite comes
/// before its dependents; among ready targets the one declared first wins.
pub fn topological_order(graph: &TargetGraph, root: usize) -> Vec<usize> {
    let members = closure(graph, root);
    let len = graph.nodes().len();

    let mut remaining = vec![0usize; len];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); len];
    for &idx in members.iter() {
        for prereq in graph.node(idx).prerequisites.iter() {
            if let Prerequisite::Target(dep) = prereq {
                remaining[idx] += 1;
                dependents[*dep].push(idx);
            }
        }
    }

    let mut ready: BTreeSet<usize> = members
        .iter()
        .copied()
        .filter(|&idx| remaining[idx] == 0)
        .collect();
    let mut order = Vec::with_capacity(members.len());

    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &dependent in dependents[idx].iter() {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    order
}

/// One target to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub target: TargetName,
    pub reason: RunReason,
}

/// Ordered execution plan for one requested target.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub requested: TargetName,
    pub steps: Vec<PlannedStep>,
    pub up_to_date: Vec<TargetName>,
    /// Targets ruled out by `run_if` / `run_unless`.
    pub skipped: Vec<TargetName>,
}

impl BuildPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.target.as_str()).collect()
    }
}

/// Compute the plan for `requested`.
///
/// `completed` holds targets already executed earlier in this invocation:
/// they are not planned again but still count as rebuilt for their
/// dependents.
///
/// Disabled targets are listed in [`BuildPlan::skipped`]; they do not count
/// as rebuilt for their dependents.
///
/// Fails if the target is unknown or a plain file prerequisite of an
/// enabled target does not exist.
pub fn plan(
    graph: &TargetGraph,
    fs: &dyn FileSystem,
    requested: &str,
    completed: &HashSet<TargetName>,
) -> Result<BuildPlan> {
    let root = graph
        .index_of(requested)
        .ok_or_else(|| BuildgraphError::UnknownTarget(requested.to_string()))?;

    let mut requires_run = vec![false; graph.nodes().len()];
    let mut plan = BuildPlan {
        requested: requested.to_string(),
        ..BuildPlan::default()
    };

    for idx in topological_order(graph, root) {
        let node = graph.node(idx);

        if completed.contains(&node.name) {
            requires_run[idx] = true;
            continue;
        }

        if !node.enabled {
            debug!(target_name = %node.name, "target skipped by its run condition");
            plan.skipped.push(node.name.clone());
            continue;
        }

        let own = OutputState::of(fs, &graph.output_paths(idx));

        let names = graph.prerequisite_names(idx);
        let mut states = Vec::with_capacity(node.prerequisites.len());
        for (prereq, name) in node.prerequisites.iter().zip(names.iter()) {
            let state = match prereq {
                Prerequisite::Target(dep) => PrerequisiteState {
                    name,
                    modified: graph
                        .output_paths(*dep)
                        .iter()
                        .filter_map(|p| fs.modified(p))
                        .max(),
                    requires_run: requires_run[*dep],
                },
                Prerequisite::File(path) => {
                    let modified = fs.modified(&graph.root().join(path));
                    if modified.is_none() {
                        return Err(BuildgraphError::NoRule {
                            path: name.clone(),
                            needed_by: node.name.clone(),
                        });
                    }
                    PrerequisiteState {
                        name,
                        modified,
                        requires_run: false,
                    }
                }
            };
            states.push(state);
        }

        match staleness(own, &states) {
            Some(reason) => {
                debug!(target_name = %node.name, %reason, "target requires execution");
                requires_run[idx] = true;
                plan.steps.push(PlannedStep {
                    target: node.name.clone(),
                    reason,
                });
            }
            None => {
                debug!(target_name = %node.name, "target is up to date");
                plan.up_to_date.push(node.name.clone());
            }
        }
    }

    Ok(plan)
}
