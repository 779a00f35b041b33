use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::imports::ImportEdge;

/// Graph keys always use `/` as the separator.
pub fn graph_key(path: &str) -> String {
    path.replace('\\', "/")
}

/// One file in the dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub imports: Vec<ImportEdge>,
    pub exports: Vec<String>,
    /// Files importing this one, sorted
    pub dependents: Vec<String>,
}

impl FileNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Distinct in-set targets of this file's imports, in import order.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for target in self.imports.iter().filter_map(|e| e.resolved.as_deref()) {
            if !seen.contains(&target) {
                seen.push(target);
            }
        }
        seen
    }
}

/// File nodes plus the reverse lookup `target -> importers`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, FileNode>,
    reverse: HashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a node. Existing reverse entries are kept.
    pub fn add_node(&mut self, mut node: FileNode) {
        node.path = graph_key(&node.path);
        self.nodes.insert(node.path.clone(), node);
    }

    /// Records that `from` imports `to`, creating empty nodes as needed.
    /// Self edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let (from, to) = (graph_key(from), graph_key(to));
        if from == to {
            return;
        }
        self.nodes
            .entry(from.clone())
            .or_insert_with(|| FileNode::new(from.clone()));
        let importers = self.reverse.entry(to.clone()).or_default();
        importers.insert(from);
        let dependents: Vec<String> = importers.iter().cloned().collect();
        self.nodes
            .entry(to.clone())
            .or_insert_with(|| FileNode::new(to))
            .dependents = dependents;
    }

    /// Adds a reverse entry without touching `FileNode::dependents`.
    pub(crate) fn link(&mut self, from: &str, to: &str) {
        if from != to {
            self.reverse
                .entry(to.to_string())
                .or_default()
                .insert(from.to_string());
        }
    }

    /// Copies every reverse set into its node's `dependents`.
    pub(crate) fn sync_dependents(&mut self) {
        for (target, importers) in &self.reverse {
            if let Some(node) = self.nodes.get_mut(target) {
                node.dependents = importers.iter().cloned().collect();
            }
        }
    }

    pub fn node(&self, path: &str) -> Option<&FileNode> {
        self.nodes.get(&graph_key(path))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    /// All node paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Importers of `path`, sorted. Empty when nothing imports it.
    pub fn dependents_of(&self, path: &str) -> Vec<&str> {
        self.reverse
            .get(&graph_key(path))
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn reverse_lookup(&self) -> &HashMap<String, BTreeSet<String>> {
        &self.reverse
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.reverse.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_node(&self, path: &str) -> bool {
        self.nodes.contains_key(&graph_key(path))
    }
}
