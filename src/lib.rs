//! Pipetrace - animates discrete object-position events over a hierarchical spatial graph.
//!
//! # Architecture
//!
//! Layered modules with strict inward-only dependencies:
//!
//! - **algebra**: Vectors, matrices, transforms, easing and ellipsoid geodesy
//! - **scene**: Spatial node descriptors and the resolved node tree
//! - **graph**: Directed pipe graph and shortest-hop path finding
//! - **curve**: Time-parameterized curves, pipe curve construction, tessellation
//! - **trajectory**: Event logs replayed into per-object sampled positions
//! - **provider**: Data source boundary and an in-memory provider
//! - **visualizer**: Binds a provider and keeps everything above in sync
//!
//! # Usage
//!
//! ```ignore
//! use pipetrace::{StaticDataProvider, TransportVisualizer};
//!
//! let mut visualizer = TransportVisualizer::default();
//! visualizer.bind(StaticDataProvider::from_json(&json)?)?;
//! visualizer.pump_events()?;
//! let position = visualizer.position_at(package_id, now);
//! ```

pub mod algebra;
pub mod config;
pub mod curve;
pub mod graph;
pub mod provider;
pub mod scene;
pub mod trajectory;
pub mod visualizer;

mod error;

// Re-export commonly used types at crate root
pub use algebra::{Cartographic, Matrix3, Transform, Vec3};
pub use config::VisualizerConfig;
pub use curve::{Curve, Interpolation};
pub use error::{Error, Result};
pub use graph::SpatialGraph;
pub use provider::{DataProvider, MetaInfo, StaticDataProvider};
pub use scene::{NodeId, SpatialNodeInfo, SpatialTree};
pub use trajectory::{EventInfo, PackageId, TrajectoryStore};
pub use visualizer::{PipePolyline, TransportVisualizer};
