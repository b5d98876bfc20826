//! Module graph recorded while bundling.
//!
//! Traversal itself is driven by the orchestrator's frontier; the graph only
//! records which module reached which so cycles can be reported afterwards.

use std::path::{Path, PathBuf};

use petgraph::{
    Direction,
    algo::{is_cyclic_directed, tarjan_scc},
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashMap;

/// Directed graph of module references, edges pointing importer → imported
#[derive(Debug, Default)]
pub struct ModuleGraph {
    graph: DiGraph<PathBuf, ()>,
    node_indices: FxHashMap<PathBuf, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, returning the existing node if already present
    pub fn add_module(&mut self, path: &Path) -> NodeIndex {
        if let Some(&index) = self.node_indices.get(path) {
            return index;
        }
        let index = self.graph.add_node(path.to_path_buf());
        self.node_indices.insert(path.to_path_buf(), index);
        index
    }

    /// Record that `from` imports `to`. Repeated edges are stored once.
    pub fn add_dependency(&mut self, from: &Path, to: &Path) {
        let from_index = self.add_module(from);
        let to_index = self.add_module(to);
        if !self.graph.contains_edge(from_index, to_index) {
            self.graph.add_edge(from_index, to_index, ());
        }
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.node_indices.contains_key(path)
    }

    /// Direct dependencies of `path`, sorted
    pub fn dependencies(&self, path: &Path) -> Vec<&Path> {
        let Some(&index) = self.node_indices.get(path) else {
            return Vec::new();
        };
        let mut dependencies: Vec<&Path> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .map(|neighbor| self.graph[neighbor].as_path())
            .collect();
        dependencies.sort();
        dependencies
    }

    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Import cycles: strongly connected components with more than one
    /// module, plus modules importing themselves.
    ///
    /// Paths are sorted within each cycle and cycles by their first path, so
    /// the result does not depend on traversal order.
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut cycles: Vec<Vec<PathBuf>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut paths: Vec<PathBuf> = component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort();
        cycles
    }
}
