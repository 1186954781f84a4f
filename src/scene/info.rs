//! Serializable descriptors of a spatial node tree, as delivered by a data provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NodeId;
use crate::algebra::{Cartographic, Matrix3, Transform, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialNodeInfo {
    pub id: NodeId,
    pub name: String,
    pub transform: NodeTransformInfo,
    #[serde(default)]
    pub expand_distance: f64,
    #[serde(default)]
    pub children: Vec<SpatialNodeInfo>,
    #[serde(default)]
    pub site: Option<SiteInfo>,
    #[serde(default)]
    pub pipes: Vec<PipeInfo>,
    #[serde(default)]
    pub collapsed_visuals: Vec<NodeVisualInfo>,
    #[serde(default)]
    pub expanded_visuals: Vec<NodeVisualInfo>,
    #[serde(default)]
    pub custom_props: Value,
}

/// Local placement of a node. Cartographic nodes anchor a local east-north-up frame
/// and are always absolute; Cartesian nodes may be relative to their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "coordinateType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeTransformInfo {
    Cartographic {
        #[serde(default)]
        relative: bool,
        #[serde(default)]
        rotation: Matrix3,
        position: Cartographic,
    },
    Cartesian {
        #[serde(default)]
        relative: bool,
        #[serde(default)]
        rotation: Matrix3,
        position: Vec3,
    },
}

impl NodeTransformInfo {
    pub fn cartesian(relative: bool, position: Vec3) -> Self {
        Self::Cartesian {
            relative,
            rotation: Matrix3::IDENTITY,
            position,
        }
    }

    pub fn cartographic(position: Cartographic) -> Self {
        Self::Cartographic {
            relative: false,
            rotation: Matrix3::IDENTITY,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_props: Value,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipeKindInfo {
    Arc,
    Line,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeInfo {
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    #[serde(default)]
    pub bi_directional: bool,
    #[serde(default = "default_pipe_width")]
    pub width: f64,
    #[serde(rename = "type")]
    pub kind: PipeKindInfo,
    #[serde(default)]
    pub explicit_path: Option<GeoPathInfo>,
    #[serde(default)]
    pub custom_props: Value,
}

fn default_pipe_width() -> f64 {
    10.0
}

/// Interpolation order requested for an explicit path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathInterpolation {
    Linear,
    Quadratic,
    Cubic,
    #[serde(other)]
    Unknown,
}

impl PathInterpolation {
    pub fn degree(self) -> Option<usize> {
        match self {
            PathInterpolation::Linear => Some(1),
            PathInterpolation::Quadratic => Some(2),
            PathInterpolation::Cubic => Some(3),
            PathInterpolation::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPathInfo {
    pub interpolation_type: PathInterpolation,
    pub components: Vec<GeoPathComponentInfo>,
}

/// Waypoints expressed in the local frame of `node_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPathComponentInfo {
    pub node_id: NodeId,
    pub points: Vec<Vec3>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(default = "opaque")]
    pub alpha: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Color {
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub uri: String,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillboardInfo {
    pub image: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub eye_offset: Vec3,
}

/// Renderer-facing decoration. Box, wall and polygon geometry are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualInfo {
    #[serde(default)]
    pub model: Option<ModelInfo>,
    #[serde(default)]
    pub billboard: Option<BillboardInfo>,
    #[serde(default, rename = "box")]
    pub box_geometry: Option<Value>,
    #[serde(default)]
    pub wall: Option<Value>,
    #[serde(default)]
    pub polygon: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeVisualInfo {
    /// Placement relative to the owning node; the node's own transform when absent.
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(flatten)]
    pub visual: VisualInfo,
}
