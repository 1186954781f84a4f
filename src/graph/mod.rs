//! Hop-count graph over spatial nodes and their pipes.
//!
//! Nodes are kept in depth-first tree order and arrows in a Structure-of-Arrays
//! layout. Graphs are small (tens to low hundreds of nodes), so neighbour queries
//! scan the arrow list instead of keeping adjacency lists.

mod traversal;

use std::collections::HashMap;

use crate::scene::{NodeId, SpatialTree};

#[derive(Debug, Clone, Default)]
pub struct SpatialGraph {
    // Node SoA (depth-first order)
    pub node_ids: Vec<NodeId>,

    // Arrow SoA
    pub arrow_sources: Vec<NodeId>,
    pub arrow_targets: Vec<NodeId>,

    node_index: HashMap<NodeId, usize>,
}

impl SpatialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One arrow per unidirectional pipe, two per bidirectional pipe.
    pub fn from_tree(tree: &SpatialTree) -> Self {
        let node_ids = tree.nodes().iter().map(|n| n.id).collect();
        let mut arrow_sources = Vec::with_capacity(tree.pipes().len() * 2);
        let mut arrow_targets = Vec::with_capacity(tree.pipes().len() * 2);

        for node in tree.nodes() {
            for pipe in node.pipes.iter().filter_map(|&id| tree.pipe(id)) {
                arrow_sources.push(pipe.from);
                arrow_targets.push(pipe.to);
                if pipe.bidirectional {
                    arrow_sources.push(pipe.to);
                    arrow_targets.push(pipe.from);
                }
            }
        }

        Self::from_vecs(node_ids, arrow_sources, arrow_targets)
    }

    /// Construct from owned vectors.
    pub fn from_vecs(
        node_ids: Vec<NodeId>,
        arrow_sources: Vec<NodeId>,
        arrow_targets: Vec<NodeId>,
    ) -> Self {
        debug_assert_eq!(arrow_sources.len(), arrow_targets.len());

        let mut node_index = HashMap::with_capacity(node_ids.len());
        for (i, &id) in node_ids.iter().enumerate() {
            node_index.entry(id).or_insert(i);
        }

        Self {
            node_ids,
            arrow_sources,
            arrow_targets,
            node_index,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn arrow_count(&self) -> usize {
        self.arrow_sources.len()
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.node_index.contains_key(&node_id)
    }

    pub fn get_node_index(&self, node_id: NodeId) -> Option<usize> {
        self.node_index.get(&node_id).copied()
    }

    /// Node ids in depth-first tree order.
    pub fn in_dfs_order(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn arrows(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.arrow_sources
            .iter()
            .copied()
            .zip(self.arrow_targets.iter().copied())
    }
}
