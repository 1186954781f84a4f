//! Spatial node trees: provider-facing descriptors and the resolved, immutable arena.
//!
//! A tree is rebuilt wholesale on every bind; absolute transforms are computed
//! once while building and never change afterwards.

mod info;
mod tree;

pub use info::{
    BillboardInfo, Color, GeoPathComponentInfo, GeoPathInfo, ModelInfo, NodeTransformInfo,
    NodeVisualInfo, PathInterpolation, PipeInfo, PipeKindInfo, SiteInfo, SpatialNodeInfo,
    VisualInfo,
};
pub use tree::{
    ExplicitPath, PathComponent, Pipe, PipeDirection, PipeKind, SpatialNode, SpatialTree,
    VisualPlacement,
};

/// Stable identifier of a spatial node within one tree build.
pub type NodeId = u32;

/// Index of a resolved pipe within its [`SpatialTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(pub usize);
