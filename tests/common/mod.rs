#![allow(dead_code)]

use std::path::Path;

use buildgraph::config::ConfigFile;
use buildgraph::dag::TargetGraph;
use buildgraph::fs::mock::MockFileSystem;
use buildgraph_test_utils::fake_probe::FakeProbe;

pub use buildgraph_test_utils::{init_tracing, with_timeout};

/// Build a graph rooted at "." against a mock filesystem.
pub fn mock_graph(cfg: &ConfigFile, fs: &MockFileSystem) -> TargetGraph {
    buildgraph::build_graph(cfg, Path::new("."), &[], fs, &FakeProbe::new())
        .expect("graph should build")
}
