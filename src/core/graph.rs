//! core::graph
//!
//! Package dependency graph and its orderings.
//!
//! # Architecture
//!
//! The dependency graph is a DAG where:
//! - Nodes are package names from the lock file
//! - An edge `A -> B` means "A declares a dependency on B"
//! - The root project has no incoming edges
//!
//! The graph is rebuilt from the lock file on every read and never patched.
//!
//! # Invariants
//!
//! - Graph must be acyclic; orderings fail with [`GraphError::Cycle`] otherwise
//! - Node names are unique

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use thiserror::Error;

/// Errors from graph ordering.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains a dependency cycle through the named package.
    #[error("dependency cycle detected involving package '{0}'")]
    Cycle(String),
}

/// The dependency graph derived from the lock file.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package node. Adding an existing name is a no-op.
    pub fn add_package(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.nodes.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), index);
        index
    }

    /// Record that `dependent` declares a dependency on `dependency`.
    ///
    /// Both nodes are created if missing. Duplicate edges are collapsed.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let from = self.add_package(dependent);
        let to = self.add_package(dependency);
        self.graph.update_edge(from, to, ());
    }

    /// Check whether a package is part of the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All package names, sorted.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        let sorted: BTreeSet<&str> = self.graph.node_weights().map(String::as_str).collect();
        sorted.into_iter()
    }

    /// Direct dependencies of a package, sorted.
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        let Some(index) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut result: Vec<&str> = self
            .graph
            .neighbors(*index)
            .map(|n| self.graph[n].as_str())
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Dependents before dependencies: for every edge `A -> B`, A precedes B.
    ///
    /// The root project sorts first and leaf dependencies sort last.
    ///
    /// # Example
    ///
    /// ```
    /// use pegboard::core::graph::DependencyGraph;
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_dependency("app", "net");
    /// graph.add_dependency("net", "log");
    ///
    /// assert_eq!(graph.topological_order().unwrap(), vec!["app", "net", "log"]);
    /// assert_eq!(graph.reverse_order().unwrap(), vec!["log", "net", "app"]);
    /// ```
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|cycle| GraphError::Cycle(self.graph[cycle.node_id()].clone()))
    }

    /// Leaves first, root project last.
    ///
    /// This is the order in which packages must be pegged: a dependency is
    /// always committed before any package that declares it.
    pub fn reverse_order(&self) -> Result<Vec<String>, GraphError> {
        let mut order = self.topological_order()?;
        order.reverse();
        Ok(order)
    }

    /// Every package that transitively declares a dependency on `name`.
    ///
    /// The result never contains `name` itself and is empty for unknown names.
    ///
    /// # Example
    ///
    /// ```
    /// use pegboard::core::graph::DependencyGraph;
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_dependency("app", "net");
    /// graph.add_dependency("net", "log");
    /// graph.add_dependency("tools", "fmt");
    ///
    /// let ancestors = graph.ancestors("log");
    /// assert!(ancestors.contains("net"));
    /// assert!(ancestors.contains("app"));
    /// assert!(!ancestors.contains("tools"));
    /// ```
    pub fn ancestors(&self, name: &str) -> BTreeSet<String> {
        let Some(start) = self.nodes.get(name) else {
            return BTreeSet::new();
        };

        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, *start);
        let mut result = BTreeSet::new();
        while let Some(node) = bfs.next(reversed) {
            if node != *start {
                result.insert(self.graph[node].clone());
            }
        }
        result
    }
}
