//! Kahn's algorithm with a sorted ready set

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::error::{MortyError, Result};

/// Topologically sort `dependencies` (node -> nodes it depends on).
///
/// The ready set is ordered, so whenever several nodes are eligible the
/// smallest key goes first. Nodes left with a non-zero in-degree are
/// reported as a cycle.
pub fn topological_sort<K: Ord + Clone + Display>(
    scope: &str,
    dependencies: &BTreeMap<K, BTreeSet<K>>,
    dependents: &BTreeMap<K, BTreeSet<K>>,
) -> Result<Vec<K>> {
    let mut in_degree: BTreeMap<&K, usize> = dependencies
        .iter()
        .map(|(node, deps)| (node, deps.len()))
        .collect();

    let mut ready: BTreeSet<&K> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(node, _)| *node)
        .collect();

    let mut order = Vec::with_capacity(dependencies.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        for dependent in dependents.get(node).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() < dependencies.len() {
        let unresolved: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(node, _)| node.to_string())
            .collect();
        tracing::warn!(scope, nodes = ?unresolved, "dependency cycle detected");
        return Err(MortyError::CycleDetected {
            scope: scope.to_string(),
            nodes: unresolved,
        });
    }

    Ok(order)
}
