//! Tests for the dependency graph

use super::*;

fn deps(names: &[&str]) -> Vec<Dependency<String>> {
    names
        .iter()
        .map(|n| match *n {
            "__ALL__" => Dependency::All,
            other => Dependency::Node(other.to_string()),
        })
        .collect()
}

fn build(nodes: &[(&str, &[&str])]) -> Result<DependencyGraph<String>> {
    DependencyGraph::build(
        "modules",
        nodes.iter().map(|(n, d)| (n.to_string(), deps(d))),
    )
}

fn position(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
}

#[test]
fn test_two_modules_in_dependency_order() {
    let graph = build(&[("B", &["A"]), ("A", &[])]).unwrap();
    assert_eq!(graph.topological_sort().unwrap(), vec!["A", "B"]);
}

#[test]
fn test_two_module_cycle() {
    let graph = build(&[("A", &["B"]), ("B", &["A"])]).unwrap();
    let err = graph.topological_sort().unwrap_err();
    match err {
        MortyError::CycleDetected { scope, nodes } => {
            assert_eq!(scope, "modules");
            assert_eq!(nodes, vec!["A", "B"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_every_edge_respected_and_each_node_once() {
    let nodes: &[(&str, &[&str])] = &[
        ("app", &["cli", "storage"]),
        ("cli", &["config"]),
        ("storage", &["config", "parser"]),
        ("parser", &[]),
        ("config", &[]),
        ("docs", &[]),
    ];
    let graph = build(nodes).unwrap();
    let order = graph.topological_sort().unwrap();

    assert_eq!(order.len(), nodes.len());
    for (node, node_deps) in nodes {
        assert_eq!(order.iter().filter(|n| n == node).count(), 1);
        for dep in *node_deps {
            assert!(position(&order, dep) < position(&order, node), "{dep} before {node}");
        }
    }
}

#[test]
fn test_ties_break_by_ascending_key_regardless_of_input_order() {
    let forward = build(&[("c", &[]), ("a", &[]), ("b", &["a"]), ("d", &["a"])]).unwrap();
    let reversed = build(&[("d", &["a"]), ("b", &["a"]), ("a", &[]), ("c", &[])]).unwrap();

    let first = forward.topological_sort().unwrap();
    assert_eq!(first, vec!["a", "b", "c", "d"]);
    assert_eq!(first, reversed.topological_sort().unwrap());
    assert_eq!(first, forward.topological_sort().unwrap());
}

#[test]
fn test_job_example_with_numeric_keys() {
    for input in [vec![3u32, 2, 1], vec![1, 2, 3], vec![2, 1, 3]] {
        let graph = DependencyGraph::build(
            "module core",
            input.into_iter().map(|job| {
                let deps = if job == 1 {
                    vec![]
                } else {
                    vec![Dependency::Node(1)]
                };
                (job, deps)
            }),
        )
        .unwrap();
        assert_eq!(graph.topological_sort().unwrap(), vec![1, 2, 3]);
    }
}

#[test]
fn test_cycle_reports_downstream_nodes_and_no_order() {
    let graph = build(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"]), ("d", &["c"]), ("e", &[])]).unwrap();
    match graph.topological_sort() {
        Err(MortyError::CycleDetected { nodes, .. }) => {
            assert_eq!(nodes, vec!["a", "b", "c", "d"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let graph = build(&[("solo", &["solo"])]).unwrap();
    assert!(matches!(
        graph.topological_sort(),
        Err(MortyError::CycleDetected { .. })
    ));
}

#[test]
fn test_all_sentinel_expands_to_every_other_node() {
    let graph = build(&[("integration", &["__ALL__"]), ("b", &[]), ("a", &["b"])]).unwrap();

    let expanded: Vec<_> = graph
        .dependencies_of(&"integration".to_string())
        .unwrap()
        .iter()
        .cloned()
        .collect();
    assert_eq!(expanded, vec!["a", "b"]);
    assert_eq!(graph.topological_sort().unwrap(), vec!["b", "a", "integration"]);
}

#[test]
fn test_two_all_sentinels_form_a_cycle() {
    let graph = build(&[("x", &["__ALL__"]), ("y", &["__ALL__"])]).unwrap();
    assert!(graph.topological_sort().is_err());
}

#[test]
fn test_unknown_dependency_rejected() {
    let err = build(&[("a", &["ghost"])]).unwrap_err();
    assert!(matches!(
        err,
        MortyError::UnknownReference { reference, .. } if reference == "ghost"
    ));
}

#[test]
fn test_empty_graph() {
    let graph = build(&[]).unwrap();
    assert!(graph.is_empty());
    assert!(graph.topological_sort().unwrap().is_empty());
}

#[test]
fn test_dependents_index() {
    let graph = build(&[("a", &[]), ("b", &["a"]), ("c", &["a"])]).unwrap();
    let dependents: Vec<_> = graph
        .dependents_of(&"a".to_string())
        .unwrap()
        .iter()
        .cloned()
        .collect();
    assert_eq!(dependents, vec!["b", "c"]);
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.nodes().count(), 3);
}
