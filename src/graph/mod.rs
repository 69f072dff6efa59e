//! Per-emitter dependency graph using petgraph.
//!
//! Edge `A → B` means "artifact B is generated (at least partly) from A".
//! Source nodes are input files; leaf nodes are output artifacts and have no
//! outgoing edges. Isolated nodes are pruned eagerly, so every node in the
//! graph has at least one edge.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::content::FileIdentity;
use crate::error::GraphError;
use crate::Result;

/// Dependency graph from source identities to artifact identities.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<FileIdentity, ()>,
    index: HashMap<FileIdentity, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge `from → to`, creating both nodes if needed. Idempotent.
    pub fn add_edge(&mut self, from: FileIdentity, to: FileIdentity) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    /// Add every edge of `other` to this graph.
    pub fn merge_graph(&mut self, other: &Self) {
        for (from, to) in other.edges() {
            self.add_edge(from, to);
        }
    }

    /// True if `id` has any outgoing (source) or incoming (leaf) edge.
    #[must_use]
    pub fn has_node(&self, id: &FileIdentity) -> bool {
        self.index.get(id).is_some_and(|&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_some()
                || self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_some()
        })
    }

    /// Replace the outgoing edges of `id` with exactly those in `single`.
    ///
    /// `single` must describe `id` alone: if any other node has outgoing
    /// edges in it the merge is rejected and this graph is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::ForeignNode` if `single` describes another node.
    pub fn merge_edges_for_node(&mut self, single: &Self, id: &FileIdentity) -> Result<()> {
        if let Some(foreign) = single.sources().into_iter().find(|s| s != id) {
            return Err(GraphError::ForeignNode {
                target: id.to_string(),
                foreign: foreign.to_string(),
            }
            .into());
        }

        let old_targets = self.clear_outgoing(id);
        for target in single.direct_targets(id) {
            self.add_edge(id.clone(), target);
        }

        for target in old_targets {
            self.prune_if_isolated(&target);
        }
        self.prune_if_isolated(id);
        Ok(())
    }

    /// Remove the edge `from → to`. Endpoints left without any edge are
    /// pruned. Returns whether the edge existed.
    pub fn remove_edge(&mut self, from: &FileIdentity, to: &FileIdentity) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        let Some(edge) = self.graph.find_edge(from_idx, to_idx) else {
            return false;
        };

        self.graph.remove_edge(edge);
        self.prune_if_isolated(from);
        self.prune_if_isolated(to);
        true
    }

    /// Swap the edges of `old` for those of `new`. Edges present in both are
    /// left alone.
    pub fn replace_edges(&mut self, old: &Self, new: &Self) {
        let keep = new.edges();
        for (from, to) in old.edges() {
            if !keep.contains(&(from.clone(), to.clone())) {
                self.remove_edge(&from, &to);
            }
        }
        self.merge_graph(new);
    }

    /// Delete `id` with all of its edges.
    ///
    /// Neighbours left without any edge (an artifact whose only source was
    /// `id`) are removed as well.
    pub fn remove_node(&mut self, id: &FileIdentity) {
        let Some(idx) = self.index.remove(id) else {
            return;
        };

        let neighbours: Vec<FileIdentity> = self
            .graph
            .neighbors_undirected(idx)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();

        self.graph.remove_node(idx);
        for neighbour in neighbours {
            self.prune_if_isolated(&neighbour);
        }
    }

    /// Leaf nodes transitively reachable from `id`.
    ///
    /// A leaf `id` is its own only downstream leaf.
    #[must_use]
    pub fn downstream_leaves(&self, id: &FileIdentity) -> BTreeSet<FileIdentity> {
        let mut leaves = BTreeSet::new();
        let Some(&start) = self.index.get(id) else {
            return leaves;
        };

        let mut visited = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            let mut outgoing = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .peekable();

            if outgoing.peek().is_none() {
                if let Some(weight) = self.graph.node_weight(node) {
                    leaves.insert(weight.clone());
                }
                continue;
            }

            for next in outgoing {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        leaves
    }

    /// Every node with an edge into any of `leaves`.
    #[must_use]
    pub fn upstreams_of_leaves<'a>(
        &self,
        leaves: impl IntoIterator<Item = &'a FileIdentity>,
    ) -> BTreeSet<FileIdentity> {
        leaves
            .into_iter()
            .filter_map(|leaf| self.index.get(leaf))
            .flat_map(|&idx| self.graph.neighbors_directed(idx, Direction::Incoming))
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    /// The minimal working set for regenerating everything `id` contributes to.
    ///
    /// Union over every leaf reachable from `id` of that leaf's direct
    /// upstreams, plus `id` itself.
    #[must_use]
    pub fn get_upstreams_of_downstream_leaf_nodes(
        &self,
        id: &FileIdentity,
    ) -> BTreeSet<FileIdentity> {
        let leaves = self.downstream_leaves(id);
        let mut upstreams = self.upstreams_of_leaves(&leaves);
        upstreams.insert(id.clone());
        upstreams
    }

    /// Number of direct upstreams of `leaf`.
    #[must_use]
    pub fn upstream_count(&self, leaf: &FileIdentity) -> usize {
        self.index.get(leaf).map_or(0, |&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .count()
        })
    }

    /// Direct targets of `id`.
    #[must_use]
    pub fn direct_targets(&self, id: &FileIdentity) -> BTreeSet<FileIdentity> {
        self.index.get(id).map_or_else(BTreeSet::new, |&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .filter_map(|n| self.graph.node_weight(n).cloned())
                .collect()
        })
    }

    /// Nodes with at least one outgoing edge.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<FileIdentity> {
        self.nodes_where(Direction::Outgoing, true)
    }

    /// Nodes with no outgoing edge.
    #[must_use]
    pub fn leaves(&self) -> BTreeSet<FileIdentity> {
        self.nodes_where(Direction::Outgoing, false)
    }

    /// Every edge as an ordered `(from, to)` set, for edge-equality checks.
    #[must_use]
    pub fn edges(&self) -> BTreeSet<(FileIdentity, FileIdentity)> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (from, to) = self.graph.edge_endpoints(e)?;
                Some((
                    self.graph.node_weight(from)?.clone(),
                    self.graph.node_weight(to)?.clone(),
                ))
            })
            .collect()
    }

    /// Get current node count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get current edge count.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn ensure_node(&mut self, id: FileIdentity) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id, idx);
        idx
    }

    /// Remove all outgoing edges of `id`, returning their former targets.
    fn clear_outgoing(&mut self, id: &FileIdentity) -> Vec<FileIdentity> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };

        let edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();

        edges
            .into_iter()
            .filter_map(|(edge, target)| {
                self.graph.remove_edge(edge);
                self.graph.node_weight(target).cloned()
            })
            .collect()
    }

    fn prune_if_isolated(&mut self, id: &FileIdentity) {
        let Some(&idx) = self.index.get(id) else {
            return;
        };
        if self.graph.neighbors_undirected(idx).next().is_none() {
            self.graph.remove_node(idx);
            self.index.remove(id);
        }
    }

    fn nodes_where(&self, direction: Direction, has_edges: bool) -> BTreeSet<FileIdentity> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, direction)
                    .next()
                    .is_some()
                    == has_edges
            })
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }
}
