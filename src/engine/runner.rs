// src/engine/runner.rs

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};

use crate::dag::plan::{plan, BuildPlan};
use crate::dag::TargetGraph;
use crate::errors::{BuildgraphError, Result};
use crate::exec::{ExecutorBackend, ScheduledCommand};
use crate::fs::FileSystem;
use crate::types::{CommandOutcome, TargetName};

/// How a whole invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every required target ran successfully (possibly none).
    Success { executed: Vec<TargetName> },
    /// A command exited non-zero; nothing after it ran.
    Failed {
        target: TargetName,
        exit_code: i32,
        executed: Vec<TargetName>,
    },
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success { .. } => 0,
            RunOutcome::Failed { exit_code, .. } => *exit_code,
        }
    }

    /// Targets whose commands all completed successfully, in execution order.
    pub fn executed(&self) -> &[TargetName] {
        match self {
            RunOutcome::Success { executed } => executed,
            RunOutcome::Failed { executed, .. } => executed,
        }
    }
}

/// Sequential target runner.
///
/// Requested targets are handled one after another. For each, a fresh plan
/// is computed from the current filesystem state and its steps are executed
/// command by command; the first non-zero exit ends the run.
pub struct Runner<E: ExecutorBackend> {
    graph: TargetGraph,
    fs: Arc<dyn FileSystem>,
    executor: E,
    /// Targets executed so far in this invocation.
    completed: HashSet<TargetName>,
}

impl<E: ExecutorBackend> Runner<E> {
    pub fn new(graph: TargetGraph, fs: Arc<dyn FileSystem>, executor: E) -> Self {
        Self {
            graph,
            fs,
            executor,
            completed: HashSet::new(),
        }
    }

    /// The requested targets, or the default target when none are given.
    pub fn requested_or_default(&self, targets: &[String]) -> Vec<TargetName> {
        if targets.is_empty() {
            vec![self.graph.default_target().to_string()]
        } else {
            targets.to_vec()
        }
    }

    /// Check every requested target before anything runs: names must exist
    /// and every plain file prerequisite must be present.
    pub fn validate(&self, targets: &[TargetName]) -> Result<()> {
        for target in targets {
            if !self.graph.contains(target) {
                return Err(BuildgraphError::UnknownTarget(target.clone()));
            }
        }
        for target in targets {
            plan(&self.graph, self.fs.as_ref(), target, &self.completed)?;
        }
        Ok(())
    }

    /// Plans for the requested targets without running anything.
    ///
    /// Targets planned for an earlier request count as rebuilt for later
    /// ones, mirroring what a real run would do.
    pub fn dry_run(&self, targets: &[String]) -> Result<Vec<BuildPlan>> {
        let targets = self.requested_or_default(targets);
        self.validate(&targets)?;

        let mut assumed = self.completed.clone();
        let mut plans = Vec::with_capacity(targets.len());
        for target in targets.iter() {
            let p = plan(&self.graph, self.fs.as_ref(), target, &assumed)?;
            assumed.extend(p.steps.iter().map(|s| s.target.clone()));
            plans.push(p);
        }
        Ok(plans)
    }

    /// Run the requested targets (or the default target).
    ///
    /// Configuration problems are returned as errors before any command
    /// runs. A failing command is not an error: it yields
    /// [`RunOutcome::Failed`] with that command's exit code.
    ///
    /// Each requested target is re-planned after the earlier ones ran, so
    /// `clean build` sees the cleaned tree. A plain file removed by an
    /// earlier target makes the later plan fail with
    /// [`BuildgraphError::NoRule`] mid-run.
    pub async fn run(&mut self, targets: &[String]) -> Result<RunOutcome> {
        let targets = self.requested_or_default(targets);
        self.validate(&targets)?;

        let mut executed = Vec::new();

        for requested in targets.iter() {
            let build_plan = plan(&self.graph, self.fs.as_ref(), requested, &self.completed)?;

            if build_plan.is_empty() {
                info!(target_name = %requested, "nothing to be done");
                continue;
            }

            for step in build_plan.steps.iter() {
                info!(target_name = %step.target, reason = %step.reason, "building target");

                let Some(node) = self.graph.get(&step.target) else {
                    return Err(BuildgraphError::UnknownTarget(step.target.clone()));
                };
                let commands: Vec<ScheduledCommand> = node
                    .commands
                    .iter()
                    .map(|raw| {
                        ScheduledCommand::new(
                            step.target.clone(),
                            raw,
                            self.graph.root().to_path_buf(),
                            node.silent,
                        )
                    })
                    .collect();

                for cmd in commands {
                    match self.executor.run_command(cmd).await? {
                        CommandOutcome::Success => {}
                        CommandOutcome::Failed(code) => {
                            error!(target_name = %step.target, exit_code = code, "target failed");
                            return Ok(RunOutcome::Failed {
                                target: step.target.clone(),
                                exit_code: code,
                                executed,
                            });
                        }
                    }
                }

                self.completed.insert(step.target.clone());
                executed.push(step.target.clone());
            }
        }

        info!(executed = executed.len(), "run complete");
        Ok(RunOutcome::Success { executed })
    }
}
