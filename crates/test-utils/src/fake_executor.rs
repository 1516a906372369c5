use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildgraph::dag::TargetGraph;
use buildgraph::errors::Result;
use buildgraph::exec::{ExecutorBackend, ScheduledCommand};
use buildgraph::fs::mock::MockFileSystem;
use buildgraph::types::CommandOutcome;

/// A fake executor that:
/// - records every command it is asked to run
/// - fails the first command of selected targets with a given exit code
/// - on success, touches the target's outputs in a `MockFileSystem`, and
///   removes any paths registered with `removes`
pub struct FakeExecutor {
    fs: MockFileSystem,
    outputs: HashMap<String, Vec<PathBuf>>,
    failures: HashMap<String, i32>,
    removals: HashMap<String, Vec<PathBuf>>,
    executed: Arc<Mutex<Vec<ScheduledCommand>>>,
}

impl FakeExecutor {
    /// Fake wired to the outputs declared in `graph`.
    pub fn for_graph(graph: &TargetGraph, fs: MockFileSystem) -> Self {
        let outputs = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.name.clone(), graph.output_paths(idx)))
            .collect();

        Self {
            fs,
            outputs,
            failures: HashMap::new(),
            removals: HashMap::new(),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(mut self, target: &str, exit_code: i32) -> Self {
        self.failures.insert(target.to_string(), exit_code);
        self
    }

    pub fn removes(mut self, target: &str, path: impl Into<PathBuf>) -> Self {
        self.removals
            .entry(target.to_string())
            .or_default()
            .push(path.into());
        self
    }

    /// Shared handle to the command log, usable after the executor moved
    /// into a `Runner`.
    pub fn log(&self) -> Arc<Mutex<Vec<ScheduledCommand>>> {
        Arc::clone(&self.executed)
    }
}

/// Distinct target names in the order their first command ran.
pub fn targets_run(log: &Arc<Mutex<Vec<ScheduledCommand>>>) -> Vec<String> {
    let guard = log.lock().unwrap();
    let mut names: Vec<String> = Vec::new();
    for cmd in guard.iter() {
        if !names.contains(&cmd.target) {
            names.push(cmd.target.clone());
        }
    }
    names
}

impl ExecutorBackend for FakeExecutor {
    fn run_command(
        &mut self,
        cmd: ScheduledCommand,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + '_>> {
        self.executed.lock().unwrap().push(cmd.clone());

        let outcome = match self.failures.get(&cmd.target) {
            Some(&code) => CommandOutcome::Failed(code),
            None => {
                for path in self.removals.get(&cmd.target).into_iter().flatten() {
                    self.fs.remove(path);
                }
                for out in self.outputs.get(&cmd.target).into_iter().flatten() {
                    self.fs.touch(out);
                }
                CommandOutcome::Success
            }
        };

        Box::pin(async move { Ok(outcome) })
    }
}
