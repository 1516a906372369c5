#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use buildgraph::engine::{RunOutcome, Runner};
use buildgraph::exec::RealExecutorBackend;
use buildgraph::fs::RealFileSystem;
use buildgraph::load_graph;
use buildgraph::vars::ShellProbe;

type TestResult = Result<(), Box<dyn Error>>;

/// Write `config` into a fresh project directory and return it.
fn project(config: &str) -> Result<TempDir, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("Buildgraph.toml"), config)?;
    Ok(dir)
}

async fn run_in(dir: &Path, targets: &[&str]) -> Result<RunOutcome, Box<dyn Error>> {
    let graph = load_graph(
        &dir.join("Buildgraph.toml"),
        &[],
        &RealFileSystem,
        &ShellProbe,
    )?;
    let mut runner = Runner::new(graph, Arc::new(RealFileSystem), RealExecutorBackend::new());
    let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
    Ok(runner.run(&targets).await?)
}

fn set_mtime(path: &Path, time: SystemTime) -> std::io::Result<()> {
    File::options().write(true).open(path)?.set_modified(time)
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn copy_target_is_skipped_until_input_changes() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = project(
            r#"
[[target]]
name = "copy"
output = "out.txt"
deps = ["in.txt"]
cmds = ["cp in.txt out.txt", "@echo copied >> log.txt"]
"#,
        )?;
        let root = dir.path();
        fs::write(root.join("in.txt"), "hello\n")?;

        assert_eq!(run_in(root, &[]).await?.exit_code(), 0);
        assert_eq!(fs::read_to_string(root.join("out.txt"))?, "hello\n");
        assert_eq!(lines(&root.join("log.txt")).len(), 1);

        let outcome = run_in(root, &["copy"]).await?;
        assert!(outcome.executed().is_empty());
        assert_eq!(lines(&root.join("log.txt")).len(), 1);

        fs::write(root.join("in.txt"), "changed\n")?;
        set_mtime(
            &root.join("in.txt"),
            SystemTime::now() + Duration::from_secs(60),
        )?;
        run_in(root, &["copy"]).await?;
        assert_eq!(fs::read_to_string(root.join("out.txt"))?, "changed\n");
        assert_eq!(lines(&root.join("log.txt")).len(), 2);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn failing_command_exit_code_is_propagated() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = project(
            r#"
[[target]]
name = "lint"
cmds = ["echo one >> log.txt", "exit 7", "echo two >> log.txt"]

[[target]]
name = "package"
cmds = ["touch packaged"]
"#,
        )?;
        let root = dir.path();

        let outcome = run_in(root, &["lint", "package"]).await?;

        assert_eq!(
            outcome,
            RunOutcome::Failed {
                target: "lint".to_string(),
                exit_code: 7,
                executed: vec![],
            }
        );
        assert_eq!(lines(&root.join("log.txt")), vec!["one"]);
        assert!(!root.join("packaged").exists());

        Ok(())
    })
    .await
}

#[tokio::test]
async fn clean_venv_keeps_other_outputs() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = project(
            r#"
[vars]
VENV = "venv"

[[target]]
name = "clean-venv"
cmds = ["rm -rf ${VENV}"]

[[target]]
name = "venv"
output = "${VENV}"
cmds = ["mkdir -p ${VENV}/bin"]

[[target]]
name = "report"
output = "output/report.txt"
deps = ["venv"]
cmds = ["mkdir -p output", "echo ok > output/report.txt"]
"#,
        )?;
        let root = dir.path();

        let outcome = run_in(root, &["report"]).await?;
        assert_eq!(outcome.executed(), ["venv".to_string(), "report".to_string()]);
        assert!(root.join("venv/bin").is_dir());

        run_in(root, &["clean-venv"]).await?;
        assert!(!root.join("venv").exists());
        assert!(root.join("output/report.txt").is_file());

        Ok(())
    })
    .await
}

#[tokio::test]
async fn shell_variables_run_in_project_root() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = project(
            r#"
[vars]
DESCRIBE = { shell = "cat describe.txt", fallback = "" }
VERSION = { version = "${DESCRIBE}" }
MISSING = { shell = "exit 1", fallback = "none" }

[[target]]
name = "stamp"
output = "stamp-${VERSION}-${MISSING}.txt"
cmds = ["touch stamp-${VERSION}-${MISSING}.txt"]
"#,
        )?;
        let root = dir.path();
        fs::write(root.join("describe.txt"), "v2.0.1-3-g1a2b3c\n")?;

        run_in(root, &[]).await?;

        assert!(root.join("stamp-2.0.1.post3+g1a2b3c-none.txt").is_file());

        Ok(())
    })
    .await
}
