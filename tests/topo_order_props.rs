use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

use buildgraph::config::ConfigFile;
use buildgraph::dag::plan::{closure, topological_order};
use buildgraph::dag::{Prerequisite, TargetGraph};
use buildgraph::fs::mock::MockFileSystem;
use buildgraph_test_utils::builders::{ConfigFileBuilder, TargetConfigBuilder};
use buildgraph_test_utils::fake_probe::FakeProbe;

// Acyclic by construction: task N only depends on tasks 0..N-1. The
// declaration order is shuffled so it differs from the dependency order.
fn dag_config_strategy(max_tasks: usize) -> impl Strategy<Value = ConfigFile> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );
        let order_strat = Just((0..num_tasks).collect::<Vec<_>>()).prop_shuffle();

        (deps_strat, order_strat).prop_map(move |(raw_deps, order)| {
            let mut builder = ConfigFileBuilder::new();
            for &i in order.iter() {
                let mut target = TargetConfigBuilder::new(&format!("task_{i}"))
                    .cmd(&format!("echo task_{i}"));

                let valid: BTreeSet<usize> = if i == 0 {
                    BTreeSet::new()
                } else {
                    raw_deps[i].iter().map(|d| d % i).collect()
                };
                for dep in valid {
                    target = target.dep(&format!("task_{dep}"));
                }
                builder = builder.with_target(target.build());
            }

            let mut all = TargetConfigBuilder::new("all");
            for i in 0..num_tasks {
                all = all.dep(&format!("task_{i}"));
            }
            builder.with_target(all.build()).build()
        })
    })
}

fn graph_for(cfg: &ConfigFile) -> TargetGraph {
    buildgraph::build_graph(
        cfg,
        std::path::Path::new("."),
        &[],
        &MockFileSystem::new(),
        &FakeProbe::new(),
    )
    .expect("generated config builds")
}

fn target_deps(graph: &TargetGraph, idx: usize) -> Vec<usize> {
    graph
        .node(idx)
        .prerequisites
        .iter()
        .filter_map(|p| match p {
            Prerequisite::Target(dep) => Some(*dep),
            Prerequisite::File(_) => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn prerequisites_come_first(cfg in dag_config_strategy(12)) {
        let graph = graph_for(&cfg);
        let root = graph.index_of("all").unwrap();
        let order = topological_order(&graph, root);

        prop_assert_eq!(order.len(), graph.nodes().len());
        let position = |idx: usize| order.iter().position(|&o| o == idx).unwrap();
        for &idx in order.iter() {
            for dep in target_deps(&graph, idx) {
                prop_assert!(position(dep) < position(idx));
            }
        }
    }

    #[test]
    fn earliest_declared_ready_target_wins(cfg in dag_config_strategy(12)) {
        let graph = graph_for(&cfg);
        let root = graph.index_of("all").unwrap();
        let order = topological_order(&graph, root);

        let mut done: HashSet<usize> = HashSet::new();
        for &chosen in order.iter() {
            let ready = (0..graph.nodes().len())
                .filter(|idx| !done.contains(idx))
                .find(|&idx| target_deps(&graph, idx).iter().all(|d| done.contains(d)));
            prop_assert_eq!(Some(chosen), ready);
            done.insert(chosen);
        }
    }

    #[test]
    fn order_covers_exactly_the_closure(
        cfg in dag_config_strategy(12),
        pick in any::<usize>(),
    ) {
        let graph = graph_for(&cfg);
        let root = pick % graph.nodes().len();
        let order = topological_order(&graph, root);

        let members = closure(&graph, root);
        let ordered: BTreeSet<usize> = order.iter().copied().collect();
        prop_assert_eq!(ordered, members);
        prop_assert_eq!(order.len(), order.iter().collect::<HashSet<_>>().len());
        prop_assert_eq!(order.last().copied(), Some(root));
    }
}
