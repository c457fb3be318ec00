//! Dependency graph over named nodes, sorted with Kahn's algorithm.
//!
//! The same graph type orders modules (keyed by module name) and the jobs of
//! one module (keyed by job index). Ties are broken by the key's `Ord`, so a
//! given graph always sorts to the same sequence.

mod scheduling;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::error::{MortyError, Result};

/// One declared dependency of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency<K> {
    Node(K),
    /// Depends on every other node in the graph.
    All,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph<K> {
    /// Names the graph in errors, e.g. "modules" or "module parser".
    scope: String,
    /// node -> nodes it depends on
    dependencies: BTreeMap<K, BTreeSet<K>>,
    /// node -> nodes that depend on it
    dependents: BTreeMap<K, BTreeSet<K>>,
}

impl<K: Ord + Clone + Display> DependencyGraph<K> {
    /// Build a graph from nodes and their declared dependencies.
    ///
    /// [`Dependency::All`] is expanded here into explicit edges to every
    /// other node, so the sorter never sees it. A dependency on a node that
    /// was not declared is an [`MortyError::UnknownReference`].
    pub fn build<I, D>(scope: impl Into<String>, nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, D)>,
        D: IntoIterator<Item = Dependency<K>>,
    {
        let scope = scope.into();
        let declared: Vec<(K, Vec<Dependency<K>>)> = nodes
            .into_iter()
            .map(|(node, deps)| (node, deps.into_iter().collect()))
            .collect();

        let mut dependencies: BTreeMap<K, BTreeSet<K>> = BTreeMap::new();
        let mut dependents: BTreeMap<K, BTreeSet<K>> = BTreeMap::new();
        for (node, _) in &declared {
            dependencies.entry(node.clone()).or_default();
            dependents.entry(node.clone()).or_default();
        }
        let all_nodes: Vec<K> = dependencies.keys().cloned().collect();

        for (node, deps) in declared {
            for dep in deps {
                let targets: Vec<K> = match dep {
                    Dependency::All => all_nodes.iter().filter(|n| **n != node).cloned().collect(),
                    Dependency::Node(target) => {
                        if !dependencies.contains_key(&target) {
                            return Err(MortyError::UnknownReference {
                                module: scope.clone(),
                                reference: target.to_string(),
                            });
                        }
                        vec![target]
                    }
                };
                for target in targets {
                    dependents.entry(target.clone()).or_default().insert(node.clone());
                    dependencies.entry(node.clone()).or_default().insert(target);
                }
            }
        }

        Ok(Self {
            scope,
            dependencies,
            dependents,
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Nodes in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.dependencies.keys()
    }

    /// Direct dependencies of `node`, after sentinel expansion.
    pub fn dependencies_of(&self, node: &K) -> Option<&BTreeSet<K>> {
        self.dependencies.get(node)
    }

    pub fn dependents_of(&self, node: &K) -> Option<&BTreeSet<K>> {
        self.dependents.get(node)
    }

    /// Every node exactly once, each after all of its dependencies.
    ///
    /// Fails with [`MortyError::CycleDetected`] and no partial order when the
    /// graph is not acyclic.
    pub fn topological_sort(&self) -> Result<Vec<K>> {
        scheduling::topological_sort(&self.scope, &self.dependencies, &self.dependents)
    }
}
