use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::event::{EventInfo, PackageInfo};
use super::replay::{Replay, ReplayOutcome, SceneLookup};
use super::sampled::SampledPosition;
use super::{seconds_since, PackageId};
use crate::algebra::Vec3;
use crate::config::TrajectoryConfig;
use crate::scene::{BillboardInfo, Color, VisualInfo};

const DEFAULT_BILLBOARD_IMAGE: &str = "./images/packet2.png";
const DEFAULT_BILLBOARD_SIZE: f64 = 16.0;

/// Everything known about one animated object.
#[derive(Debug, Clone)]
pub struct ObjectState {
    pub id: PackageId,
    pub name: String,
    pub description: Option<String>,
    pub visual: VisualInfo,
    pub custom_props: Value,
    events: Vec<EventInfo>,
    samples: SampledPosition,
    parents: BTreeSet<PackageId>,
    destroyed_at: Option<f64>,
}

impl ObjectState {
    fn new(id: PackageId, degree: usize) -> Self {
        let mut state = Self {
            id,
            name: String::new(),
            description: None,
            visual: VisualInfo::default(),
            custom_props: Value::Null,
            events: Vec::new(),
            samples: SampledPosition::new(degree),
            parents: BTreeSet::new(),
            destroyed_at: None,
        };
        state.apply_info(None);
        state
    }

    /// Events sorted by time; equal times keep arrival order.
    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }

    pub fn samples(&self) -> &SampledPosition {
        &self.samples
    }

    pub fn position_at(&self, time: f64) -> Option<Vec3> {
        self.samples.position_at(time)
    }

    /// Objects this one rode along with during the last replay.
    pub fn parents(&self) -> &BTreeSet<PackageId> {
        &self.parents
    }

    pub fn destroyed_at(&self) -> Option<f64> {
        self.destroyed_at
    }

    fn insert_event(&mut self, event: EventInfo) {
        let index = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(index, event);
    }

    fn apply_info(&mut self, info: Option<PackageInfo>) {
        match info {
            Some(info) => {
                self.name = info.name;
                self.description = info.description;
                self.visual = info.visual;
                self.custom_props = info.custom_props;
            }
            None => {
                self.name = format!("packet {}", self.id);
                self.description = None;
                self.visual = default_visual(self.id);
                self.custom_props = Value::Null;
            }
        }
    }

    fn apply(&mut self, outcome: ReplayOutcome) {
        self.apply_info(outcome.info);
        self.samples = outcome.samples;
        self.parents = outcome.parents;
        self.destroyed_at = outcome.destroyed_at;
    }
}

/// A billboard with a saturated colour picked from the id, so the same object
/// always looks the same.
fn default_visual(id: PackageId) -> VisualInfo {
    let hash = id.wrapping_add(1).wrapping_mul(0x9E37_79B9);
    let value = f64::from((hash >> 8) & 0xff) / 255.0;
    let color = match (hash >> 24) % 6 {
        0 => Color::new(value, 0.0, 1.0, 1.0),
        1 => Color::new(value, 1.0, 0.0, 1.0),
        2 => Color::new(0.0, value, 1.0, 1.0),
        3 => Color::new(1.0, value, 0.0, 1.0),
        4 => Color::new(0.0, 1.0, value, 1.0),
        _ => Color::new(1.0, 0.0, value, 1.0),
    };
    VisualInfo {
        billboard: Some(BillboardInfo {
            image: DEFAULT_BILLBOARD_IMAGE.to_string(),
            width: DEFAULT_BILLBOARD_SIZE,
            height: DEFAULT_BILLBOARD_SIZE,
            color: Some(color),
            eye_offset: Vec3::new(0.0, 0.0, -2.0),
        }),
        ..VisualInfo::default()
    }
}

/// Per-object trajectories for one bound dataset.
///
/// Objects are created on first reference. Every event replays the affected
/// object's whole log, then every object riding on it, breadth first.
#[derive(Debug)]
pub struct TrajectoryStore {
    epoch: DateTime<Utc>,
    config: TrajectoryConfig,
    objects: HashMap<PackageId, ObjectState>,
    // parent -> objects that attach to it
    dependents: HashMap<PackageId, BTreeSet<PackageId>>,
}

impl TrajectoryStore {
    pub fn new(epoch: DateTime<Utc>, config: TrajectoryConfig) -> Self {
        Self {
            epoch,
            config,
            objects: HashMap::new(),
            dependents: HashMap::new(),
        }
    }

    /// Time zero of the sample axis.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn seconds(&self, time: DateTime<Utc>) -> f64 {
        seconds_since(self.epoch, time)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: PackageId) -> Option<&ObjectState> {
        self.objects.get(&id)
    }

    /// All object ids, ascending.
    pub fn ids(&self) -> Vec<PackageId> {
        let mut ids: Vec<PackageId> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectState> {
        self.objects.values()
    }

    pub fn get_or_create(&mut self, id: PackageId) -> &mut ObjectState {
        let degree = self.config.interpolation_degree;
        self.objects
            .entry(id)
            .or_insert_with(|| ObjectState::new(id, degree))
    }

    /// Objects that attached to `parent` in their last replay, ascending.
    pub fn dependents(&self, parent: PackageId) -> impl Iterator<Item = PackageId> + '_ {
        self.dependents.get(&parent).into_iter().flatten().copied()
    }

    /// Records `event` and re-synthesizes its object plus everything riding on it.
    /// Returns the ids that were replayed, in replay order.
    pub fn insert_event<S>(&mut self, event: EventInfo, scene: &S) -> Vec<PackageId>
    where
        S: SceneLookup + ?Sized,
    {
        let id = event.package_id;
        self.get_or_create(id).insert_event(event);
        self.cascade(id, scene)
    }

    /// Replays `id`, then its dependents breadth first, each at most once.
    pub fn cascade<S>(&mut self, id: PackageId, scene: &S) -> Vec<PackageId>
    where
        S: SceneLookup + ?Sized,
    {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([id]);
        visited.insert(id);

        while let Some(current) = queue.pop_front() {
            self.recompute(current, scene);
            order.push(current);
            for dependent in self.dependents(current).collect::<Vec<_>>() {
                if visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() > 1 {
            debug!(package_id = id, replayed = order.len(), "cascaded to dependents");
        }
        order
    }

    /// Replays one object's log from scratch.
    pub fn recompute<S>(&mut self, id: PackageId, scene: &S)
    where
        S: SceneLookup + ?Sized,
    {
        let outcome = {
            let Some(object) = self.objects.get(&id) else {
                return;
            };
            let objects = &self.objects;
            let epoch = self.epoch;
            Replay::new(scene, |parent| objects.get(&parent).map(|o| o.samples()), &self.config)
                .run(&object.events, |e| seconds_since(epoch, e.time))
        };

        let previous = self
            .objects
            .get(&id)
            .map(|o| o.parents.clone())
            .unwrap_or_default();
        for parent in previous.difference(&outcome.parents) {
            if let Some(children) = self.dependents.get_mut(parent) {
                children.remove(&id);
                if children.is_empty() {
                    self.dependents.remove(parent);
                }
            }
        }
        for &parent in &outcome.parents {
            self.dependents.entry(parent).or_default().insert(id);
            self.get_or_create(parent);
        }

        if let Some(object) = self.objects.get_mut(&id) {
            object.apply(outcome);
        }
    }

    /// Drops every object and dependency.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.dependents.clear();
    }
}
