use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use super::info::{NodeTransformInfo, NodeVisualInfo, PipeInfo, PipeKindInfo, SiteInfo, SpatialNodeInfo};
use super::{NodeId, PipeId};
use crate::algebra::{Transform, Vec3};
use crate::error::{Error, Result};

/// A node of the resolved tree. Its absolute transform is computed once at build time.
#[derive(Debug, Clone)]
pub struct SpatialNode {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: NodeTransformInfo,
    pub absolute: Transform,
    pub expand_distance: f64,
    pub site: Option<SiteInfo>,
    /// Pipes declared on this node that resolved successfully.
    pub pipes: Vec<PipeId>,
    pub collapsed_visuals: Vec<NodeVisualInfo>,
    pub expanded_visuals: Vec<NodeVisualInfo>,
    pub custom_props: Value,
}

impl SpatialNode {
    pub fn position(&self) -> Vec3 {
        self.absolute.offset
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathComponent {
    pub node: NodeId,
    pub points: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitPath {
    /// 1 = linear, 2 = quadratic, 3 = cubic.
    pub degree: usize,
    pub components: Vec<PathComponent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipeKind {
    Arc,
    Line,
    Explicit(ExplicitPath),
}

/// A connection between two resolved nodes of the same tree.
#[derive(Debug, Clone)]
pub struct Pipe {
    pub id: PipeId,
    /// Node that declared the pipe.
    pub owner: NodeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: PipeKind,
    pub bidirectional: bool,
    pub width: f64,
    pub custom_props: Value,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PipeDirection {
    Forward,
    Backward,
}

impl Pipe {
    /// Direction of travel from `from` to `to`, or `None` if the pair does not match this pipe.
    pub fn direction_between(&self, from: NodeId, to: NodeId) -> Option<PipeDirection> {
        if self.from == from && self.to == to {
            Some(PipeDirection::Forward)
        } else if self.from == to && self.to == from {
            Some(PipeDirection::Backward)
        } else {
            None
        }
    }

    /// `(start, end)` node ids when travelling in `direction`.
    pub fn endpoints(&self, direction: PipeDirection) -> (NodeId, NodeId) {
        match direction {
            PipeDirection::Forward => (self.from, self.to),
            PipeDirection::Backward => (self.to, self.from),
        }
    }
}

/// Absolute placement of one node decoration.
#[derive(Debug, Clone)]
pub struct VisualPlacement<'a> {
    pub node: NodeId,
    pub collapsed: bool,
    pub transform: Transform,
    pub visual: &'a NodeVisualInfo,
}

/// Arena of spatial nodes in depth-first order, plus every resolved pipe.
///
/// Built wholesale from a [`SpatialNodeInfo`] tree and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SpatialTree {
    nodes: Vec<SpatialNode>,
    pipes: Vec<Pipe>,
    node_index: HashMap<NodeId, usize>,
    pipes_by_ends: HashMap<(NodeId, NodeId), PipeId>,
}

impl SpatialTree {
    /// Resolves the tree. Pipes that refer to unknown nodes are dropped with a warning;
    /// an explicit pipe without path data fails the whole build.
    pub fn build(root: &SpatialNodeInfo) -> Result<Self> {
        let mut tree = Self {
            nodes: Vec::new(),
            pipes: Vec::new(),
            node_index: HashMap::new(),
            pipes_by_ends: HashMap::new(),
        };

        let mut infos = Vec::new();
        tree.add_subtree(root, None, &Transform::IDENTITY, &mut infos);

        for (index, info) in infos.iter().enumerate() {
            for pipe_info in &info.pipes {
                if let Some(pipe_id) = tree.resolve_pipe(info.id, pipe_info)? {
                    tree.nodes[index].pipes.push(pipe_id);
                }
            }
        }

        Ok(tree)
    }

    fn add_subtree<'a>(
        &mut self,
        info: &'a SpatialNodeInfo,
        parent: Option<NodeId>,
        parent_absolute: &Transform,
        infos: &mut Vec<&'a SpatialNodeInfo>,
    ) {
        let absolute = absolute_transform(info.id, &info.transform, parent_absolute);
        let index = self.nodes.len();

        if self.node_index.contains_key(&info.id) {
            warn!(node_id = info.id, "duplicate node id, later node is not addressable");
        } else {
            self.node_index.insert(info.id, index);
        }

        self.nodes.push(SpatialNode {
            id: info.id,
            name: info.name.clone(),
            parent,
            children: info.children.iter().map(|c| c.id).collect(),
            local: info.transform.clone(),
            absolute,
            expand_distance: info.expand_distance,
            site: info.site.clone(),
            pipes: Vec::new(),
            collapsed_visuals: info.collapsed_visuals.clone(),
            expanded_visuals: info.expanded_visuals.clone(),
            custom_props: info.custom_props.clone(),
        });
        infos.push(info);

        for child in &info.children {
            self.add_subtree(child, Some(info.id), &absolute, infos);
        }
    }

    fn resolve_pipe(&mut self, owner: NodeId, info: &PipeInfo) -> Result<Option<PipeId>> {
        let mut referenced = vec![info.from_node_id, info.to_node_id];
        if let Some(path) = &info.explicit_path {
            referenced.extend(path.components.iter().map(|c| c.node_id));
        }
        if let Some(missing) = referenced.iter().find(|id| !self.node_index.contains_key(*id)) {
            warn!(
                owner,
                missing_node_id = *missing,
                "pipe or its path refers to a non-existing node, dropping pipe"
            );
            return Ok(None);
        }

        let kind = match info.kind {
            PipeKindInfo::Arc => PipeKind::Arc,
            PipeKindInfo::Line => PipeKind::Line,
            PipeKindInfo::Explicit => {
                let path = info.explicit_path.as_ref().ok_or(Error::MissingExplicitPath {
                    from: info.from_node_id,
                    to: info.to_node_id,
                })?;
                let degree = path.interpolation_type.degree().unwrap_or_else(|| {
                    warn!(
                        from = info.from_node_id,
                        to = info.to_node_id,
                        "unknown interpolation type, using linear"
                    );
                    1
                });
                PipeKind::Explicit(ExplicitPath {
                    degree,
                    components: path
                        .components
                        .iter()
                        .map(|c| PathComponent {
                            node: c.node_id,
                            points: c.points.clone(),
                        })
                        .collect(),
                })
            }
        };

        let id = PipeId(self.pipes.len());
        self.pipes.push(Pipe {
            id,
            owner,
            from: info.from_node_id,
            to: info.to_node_id,
            kind,
            bidirectional: info.bi_directional,
            width: info.width,
            custom_props: info.custom_props.clone(),
        });
        self.pipes_by_ends
            .insert(unordered_key(info.from_node_id, info.to_node_id), id);
        Ok(Some(id))
    }

    pub fn root(&self) -> Option<&SpatialNode> {
        self.nodes.first()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&SpatialNode> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Nodes in depth-first (pre-order) order.
    pub fn nodes(&self) -> &[SpatialNode] {
        &self.nodes
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn pipe(&self, id: PipeId) -> Option<&Pipe> {
        self.pipes.get(id.0)
    }

    /// Absolute position of a node (its site anchor).
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(SpatialNode::position)
    }

    /// The pipe joining two nodes in either direction. The last declared one wins.
    pub fn pipe_between(&self, a: NodeId, b: NodeId) -> Option<&Pipe> {
        self.pipes_by_ends
            .get(&unordered_key(a, b))
            .and_then(|&id| self.pipe(id))
    }

    /// Absolute placements for every node decoration, collapsed ones first per node.
    pub fn visual_placements(&self) -> Vec<VisualPlacement<'_>> {
        let mut result = Vec::new();
        for node in &self.nodes {
            let tagged = node
                .collapsed_visuals
                .iter()
                .map(|v| (true, v))
                .chain(node.expanded_visuals.iter().map(|v| (false, v)));
            for (collapsed, visual) in tagged {
                let transform = match &visual.transform {
                    Some(local) => Transform::combine(local, &node.absolute),
                    None => node.absolute,
                };
                result.push(VisualPlacement {
                    node: node.id,
                    collapsed,
                    transform,
                    visual,
                });
            }
        }
        result
    }
}

fn unordered_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn absolute_transform(id: NodeId, local: &NodeTransformInfo, parent: &Transform) -> Transform {
    match local {
        NodeTransformInfo::Cartographic {
            relative,
            rotation,
            position,
        } => {
            if *relative {
                warn!(node_id = id, "cartographic transform cannot be relative, treating as absolute");
            }
            let frame = Transform::east_north_up(position.to_cartesian());
            Transform::combine(&Transform::rotation(*rotation), &frame)
        }
        NodeTransformInfo::Cartesian {
            relative,
            rotation,
            position,
        } => {
            let own = Transform::new(1.0, *rotation, *position);
            if *relative {
                Transform::combine(&own, parent)
            } else {
                own
            }
        }
    }
}
