use super::SpatialGraph;
use crate::scene::NodeId;
use std::collections::{HashMap, HashSet, VecDeque};

impl SpatialGraph {
    /// Nodes joined to `node_id` by an arrow in either direction, in
    /// arrow-list order. Parallel and reciprocal arrows collapse to one neighbour.
    pub fn neighbors(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        for (source, target) in self.arrows() {
            if source == node_id && seen.insert(target) {
                result.push(target);
            }
            if target == node_id && seen.insert(source) {
                result.push(source);
            }
        }
        result
    }

    /// Targets of every arrow leaving `node_id`, in arrow-list order.
    pub fn next(&self, node_id: NodeId) -> Vec<NodeId> {
        self.arrows()
            .filter(|&(source, _)| source == node_id)
            .map(|(_, target)| target)
            .collect()
    }

    pub fn has_arrow(&self, from: NodeId, to: NodeId) -> bool {
        self.arrows().any(|arrow| arrow == (from, to))
    }

    /// Shortest path by hop count, inclusive of both ends.
    /// Returns None if `to` is unreachable or either id is unknown.
    ///
    /// Ties between equal-length paths go to whichever arrow is discovered
    /// first in arrow-list order.
    pub fn find_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }

        let mut predecessors: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited = HashSet::with_capacity(self.node_count());
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(node_id) = queue.pop_front() {
            if node_id == to {
                break;
            }
            for target in self.next(node_id) {
                if !visited.insert(target) {
                    continue;
                }
                predecessors.insert(target, node_id);
                queue.push_back(target);
            }
        }

        if !visited.contains(&to) {
            return None;
        }

        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = *predecessors.get(&current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}
