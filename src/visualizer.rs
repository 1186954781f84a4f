//! Binds a data provider to the scene, curve and trajectory layers.

use std::sync::mpsc::{self, Receiver};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::algebra::Vec3;
use crate::config::VisualizerConfig;
use crate::curve::{curve_to_polyline, Curve, PipeCurveCache};
use crate::error::{Error, Result};
use crate::graph::SpatialGraph;
use crate::provider::{DataProvider, MetaInfo, StaticDataProvider, SubscriptionToken};
use crate::scene::{NodeId, PipeDirection, PipeId, SpatialTree, VisualPlacement};
use crate::trajectory::{EventInfo, ObjectState, PackageId, SceneLookup, TrajectoryStore};

/// Static geometry for one direction of a pipe.
#[derive(Debug, Clone, PartialEq)]
pub struct PipePolyline {
    pub pipe: PipeId,
    pub direction: PipeDirection,
    pub points: Vec<Vec3>,
    pub width: f64,
}

/// Read-only scene data shared by every trajectory replay.
#[derive(Debug)]
struct BoundScene {
    meta: MetaInfo,
    tree: SpatialTree,
    graph: SpatialGraph,
    curves: PipeCurveCache,
    polylines: Vec<PipePolyline>,
}

impl BoundScene {
    fn build<P: DataProvider + ?Sized>(provider: &P, config: &VisualizerConfig) -> Result<Self> {
        let meta = provider.meta()?;
        let root = provider.spatial_subtree(meta.root_node_id)?;
        let tree = SpatialTree::build(&root)?;
        let graph = SpatialGraph::from_tree(&tree);

        let mut curves = PipeCurveCache::new();
        curves.build_all(&tree, &config.curve)?;

        let mut polylines = Vec::new();
        for pipe in tree.pipes() {
            let mut directions = vec![PipeDirection::Forward];
            if pipe.bidirectional {
                directions.push(PipeDirection::Backward);
            }
            for direction in directions {
                let curve = curves
                    .get(pipe.id, direction)
                    .ok_or(Error::UnknownPipe(pipe.id.0))?;
                let (end_tolerance, mid_tolerance) =
                    config.tessellation.tolerances(curve.chord_length());
                polylines.push(PipePolyline {
                    pipe: pipe.id,
                    direction,
                    points: curve_to_polyline(curve, end_tolerance, mid_tolerance)?,
                    width: pipe.width,
                });
            }
        }

        Ok(Self {
            meta,
            tree,
            graph,
            curves,
            polylines,
        })
    }
}

impl SceneLookup for BoundScene {
    fn node_position(&self, node: NodeId) -> Option<Vec3> {
        self.tree.position(node)
    }

    fn pipe_curve(&self, from: NodeId, to: NodeId) -> Option<&Curve> {
        let pipe = self.tree.pipe_between(from, to)?;
        let direction = pipe.direction_between(from, to)?;
        self.curves.get(pipe.id, direction)
    }

    fn origin(&self) -> Vec3 {
        self.tree.root().map_or(Vec3::ZERO, |root| root.position())
    }
}

#[derive(Debug)]
struct Bound<P> {
    provider: P,
    subscription: SubscriptionToken,
    events: Receiver<EventInfo>,
    scene: BoundScene,
    store: TrajectoryStore,
}

/// Animates a provider's objects over its spatial tree.
///
/// Single-threaded: events are pulled from the subscription channel by
/// [`pump_events`](Self::pump_events) and processed synchronously.
#[derive(Debug)]
pub struct TransportVisualizer<P: DataProvider = StaticDataProvider> {
    config: VisualizerConfig,
    bound: Option<Bound<P>>,
}

impl<P: DataProvider> TransportVisualizer<P> {
    pub fn new(config: VisualizerConfig) -> Self {
        Self {
            config,
            bound: None,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Drops any previous binding, then loads the provider's tree, builds every
    /// pipe curve and subscribes to its events. On error nothing stays bound.
    pub fn bind(&mut self, mut provider: P) -> Result<()> {
        self.reset();

        let scene = BoundScene::build(&provider, &self.config)?;
        let store = TrajectoryStore::new(scene.meta.start_time, self.config.trajectory);
        let (sink, events) = mpsc::channel();
        let subscription = provider.subscribe(sink);

        info!(
            root = scene.meta.root_node_id,
            nodes = scene.tree.node_count(),
            pipes = scene.tree.pipes().len(),
            "bound dataset"
        );
        self.bound = Some(Bound {
            provider,
            subscription,
            events,
            scene,
            store,
        });
        Ok(())
    }

    /// Unsubscribes and hands the provider back, discarding all derived state.
    pub fn unbind(&mut self) -> Option<P> {
        let mut bound = self.bound.take()?;
        bound.provider.unsubscribe(bound.subscription);
        debug!(objects = bound.store.len(), "unbound dataset");
        Some(bound.provider)
    }

    /// Discards every trajectory, curve and subscription.
    pub fn reset(&mut self) {
        self.unbind();
    }

    pub fn provider_mut(&mut self) -> Option<&mut P> {
        self.bound.as_mut().map(|b| &mut b.provider)
    }

    /// Processes one event and returns the objects that were re-synthesized.
    pub fn on_event(&mut self, event: EventInfo) -> Result<Vec<PackageId>> {
        let bound = self.bound.as_mut().ok_or(Error::NotBound)?;
        Ok(bound.store.insert_event(event, &bound.scene))
    }

    /// Processes every event waiting on the subscription. Returns how many there were.
    pub fn pump_events(&mut self) -> Result<usize> {
        let bound = self.bound.as_mut().ok_or(Error::NotBound)?;
        let pending: Vec<EventInfo> = bound.events.try_iter().collect();
        for event in &pending {
            bound.store.insert_event(event.clone(), &bound.scene);
        }
        Ok(pending.len())
    }

    pub fn meta(&self) -> Option<&MetaInfo> {
        self.bound.as_ref().map(|b| &b.scene.meta)
    }

    pub fn tree(&self) -> Option<&SpatialTree> {
        self.bound.as_ref().map(|b| &b.scene.tree)
    }

    pub fn graph(&self) -> Option<&SpatialGraph> {
        self.bound.as_ref().map(|b| &b.scene.graph)
    }

    pub fn find_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        self.graph()?.find_path(from, to)
    }

    /// Polylines for every declared pipe direction, in pipe order.
    pub fn pipe_polylines(&self) -> &[PipePolyline] {
        self.bound
            .as_ref()
            .map(|b| b.scene.polylines.as_slice())
            .unwrap_or_default()
    }

    /// Curve for travelling from `from` to `to`, in either declared orientation.
    pub fn pipe_curve(&self, from: NodeId, to: NodeId) -> Option<&Curve> {
        self.bound.as_ref()?.scene.pipe_curve(from, to)
    }

    pub fn visual_placements(&self) -> Vec<VisualPlacement<'_>> {
        self.tree()
            .map(SpatialTree::visual_placements)
            .unwrap_or_default()
    }

    pub fn trajectories(&self) -> Option<&TrajectoryStore> {
        self.bound.as_ref().map(|b| &b.store)
    }

    pub fn trajectory(&self, id: PackageId) -> Option<&ObjectState> {
        self.trajectories()?.get(id)
    }

    /// Where object `id` is at wall-clock `time`.
    pub fn position_at(&self, id: PackageId, time: DateTime<Utc>) -> Option<Vec3> {
        let store = self.trajectories()?;
        store.get(id)?.position_at(store.seconds(time))
    }
}

impl<P: DataProvider> Default for TransportVisualizer<P> {
    fn default() -> Self {
        Self::new(VisualizerConfig::default())
    }
}
