// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod vars;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{parse_config, parse_override};
use crate::config::model::ConfigFile;
use crate::dag::{BuildPlan, TargetGraph};
use crate::engine::Runner;
use crate::errors::Result;
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::vars::{resolve_bindings, CommandProbe, ResolveContext, ShellProbe};

/// Entry point used by `main.rs`: load, then list, dry-run or run.
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    // Commands run with the root as cwd, so `${ROOT_DIR}` must be absolute.
    let config_path = std::path::absolute(&args.config)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let graph = load_graph(&config_path, &args.overrides, fs.as_ref(), &ShellProbe)?;

    if args.list {
        print_targets(&graph);
        return Ok(0);
    }

    let mut runner = Runner::new(graph, fs, RealExecutorBackend::new());

    if args.dry_run {
        let plans = runner.dry_run(&args.targets)?;
        print_dry_run(&plans);
        return Ok(0);
    }

    let outcome = runner.run(&args.targets).await?;
    Ok(outcome.exit_code())
}

/// Load the config at `config_path` and build its target graph.
///
/// Commands run in, and relative paths resolve against, the config file's
/// directory.
pub fn load_graph(
    config_path: &Path,
    overrides: &[String],
    fs: &dyn FileSystem,
    probe: &dyn CommandProbe,
) -> Result<TargetGraph> {
    let contents = fs.read_to_string(config_path)?;
    let cfg = parse_config(&contents)?;
    let overrides = overrides
        .iter()
        .map(|s| parse_override(s))
        .collect::<Result<Vec<_>>>()?;
    let root = config_root_dir(config_path);
    build_graph(&cfg, &root, &overrides, fs, probe)
}

/// Resolve variables once and build the graph from an already loaded config.
pub fn build_graph(
    cfg: &ConfigFile,
    root: &Path,
    overrides: &[(String, String)],
    fs: &dyn FileSystem,
    probe: &dyn CommandProbe,
) -> Result<TargetGraph> {
    let ctx = ResolveContext::new(root.to_path_buf(), fs, probe);
    let bindings = resolve_bindings(cfg.vars(), overrides, &ctx)?;
    for (name, value) in bindings.iter() {
        debug!(var = %name, value = %value, "binding");
    }

    let graph = TargetGraph::build(cfg, &bindings, root)?;
    info!(
        targets = graph.nodes().len(),
        default = %graph.default_target(),
        "loaded target graph"
    );
    Ok(graph)
}

/// Project root: the directory holding the config file, or the current
/// directory for a bare file name.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// `--list` output: targets in declaration order.
fn print_targets(graph: &TargetGraph) {
    let width = graph.nodes().iter().map(|n| n.name.len()).max().unwrap_or(0);
    for node in graph.nodes() {
        let marker = if node.name == graph.default_target() {
            " (default)"
        } else {
            ""
        };
        match node.description {
            Some(ref desc) => println!("{:width$}  {desc}{marker}", node.name),
            None => println!("{:width$}{marker}", node.name),
        }
    }
}

/// `--dry-run` output: each plan's steps with the reason they run.
fn print_dry_run(plans: &[BuildPlan]) {
    for p in plans {
        debug!(target_name = %p.requested, up_to_date = ?p.up_to_date, "planned");
        if p.is_empty() {
            println!("{}: up to date", p.requested);
        } else {
            println!("{}:", p.requested);
            for step in p.steps.iter() {
                println!("  {} ({})", step.target, step.reason);
            }
        }
        for name in p.skipped.iter() {
            println!("  {name} (skipped)");
        }
    }

    debug!("dry-run complete (no execution)");
}
