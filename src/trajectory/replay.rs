//! Replays one object's event log into dense position samples.

use std::collections::BTreeSet;

use tracing::debug;

use super::event::{EventInfo, PackageEvent, PackageInfo, PackagePosition};
use super::sampled::SampledPosition;
use super::PackageId;
use crate::algebra::{ease, lerp, Vec3};
use crate::config::TrajectoryConfig;
use crate::curve::Curve;
use crate::scene::NodeId;

/// Read access to the bound scene needed while replaying.
pub trait SceneLookup {
    /// Absolute position of a site node.
    fn node_position(&self, node: NodeId) -> Option<Vec3>;

    /// Curve for travelling from `from` to `to` along the pipe joining them.
    fn pipe_curve(&self, from: NodeId, to: NodeId) -> Option<&Curve>;

    /// Where an object created without a placement sits until it first moves.
    fn origin(&self) -> Vec3 {
        Vec3::ZERO
    }
}

/// An observed `(time, progress)` pair on the current pipe.
#[derive(Debug, Copy, Clone, PartialEq)]
struct PipeSample {
    time: f64,
    progress: f64,
}

/// Accumulation state between events.
#[derive(Debug, Clone, PartialEq)]
enum RunState {
    Idle,
    PendingParent {
        parent: PackageId,
        since: f64,
    },
    PendingPipe {
        from: NodeId,
        to: NodeId,
        samples: Vec<PipeSample>,
    },
}

/// What a replay learned about one object.
#[derive(Debug, Clone)]
pub(crate) struct ReplayOutcome {
    /// Info from the latest creation or info-modified event.
    pub info: Option<PackageInfo>,
    pub samples: SampledPosition,
    pub parents: BTreeSet<PackageId>,
    pub destroyed_at: Option<f64>,
}

pub(crate) struct Replay<'a, S: SceneLookup + ?Sized, P> {
    scene: &'a S,
    parent_samples: P,
    ease_passes: u32,
    state: RunState,
    samples: SampledPosition,
    parents: BTreeSet<PackageId>,
    last_emitted: f64,
    last_decoded: f64,
}

impl<'a, S, P> Replay<'a, S, P>
where
    S: SceneLookup + ?Sized,
    P: Fn(PackageId) -> Option<&'a SampledPosition>,
{
    pub fn new(scene: &'a S, parent_samples: P, config: &TrajectoryConfig) -> Self {
        Self {
            scene,
            parent_samples,
            ease_passes: config.ease_passes,
            state: RunState::Idle,
            samples: SampledPosition::new(config.interpolation_degree),
            parents: BTreeSet::new(),
            last_emitted: 0.0,
            last_decoded: 0.0,
        }
    }

    /// Replays `events` (sorted by time) from scratch. `seconds` maps event
    /// timestamps onto the sample time axis.
    pub fn run(
        mut self,
        events: &[EventInfo],
        seconds: impl Fn(&EventInfo) -> f64,
    ) -> ReplayOutcome {
        let mut info = None;
        let mut destroyed_at = None;
        let mut unplaced_since = None;

        let created = events.iter().find_map(|e| match &e.event {
            PackageEvent::Created { .. } => Some(seconds(e)),
            _ => None,
        });
        if let Some(time) = created {
            self.last_emitted = time;
        }

        for event in events {
            let time = seconds(event);
            self.last_decoded = time;

            match &event.event {
                PackageEvent::Created { package } => {
                    info = Some(package.clone());
                    match package.position {
                        Some(position) => self.on_moved(time, position),
                        None => {
                            unplaced_since.get_or_insert(time);
                        }
                    }
                }
                PackageEvent::InfoModified { package } => info = Some(package.clone()),
                PackageEvent::Moved { new_position } => self.on_moved(time, *new_position),
                PackageEvent::Destroyed => destroyed_at = Some(time),
            }
        }

        self.flush_parent();
        self.flush_pipe();
        if let Some(time) = unplaced_since {
            self.place_at_creation(time);
        }

        ReplayOutcome {
            info,
            samples: self.samples,
            parents: self.parents,
            destroyed_at,
        }
    }

    fn on_moved(&mut self, time: f64, position: PackagePosition) {
        self.flush_parent();

        match position {
            PackagePosition::ParentPackage { parent_id } => {
                self.flush_pipe();
                self.parents.insert(parent_id);
                self.state = RunState::PendingParent {
                    parent: parent_id,
                    since: time,
                };
            }
            PackagePosition::Site { node_id } => {
                self.flush_pipe();
                match self.scene.node_position(node_id) {
                    Some(position) => self.emit(time, position),
                    None => debug!(node_id, "site is not part of the bound tree, skipping"),
                }
            }
            PackagePosition::Pipe { from, to, progress } => {
                let same_run = matches!(
                    &self.state,
                    RunState::PendingPipe { from: run_from, to: run_to, .. }
                        if *run_from == from && *run_to == to
                );
                if !same_run {
                    self.flush_pipe();
                    self.state = RunState::PendingPipe {
                        from,
                        to,
                        samples: Vec::new(),
                    };
                }
                if let RunState::PendingPipe { samples, .. } = &mut self.state {
                    samples.push(PipeSample { time, progress });
                }
            }
            PackagePosition::Absolute { carto } => {
                self.flush_pipe();
                self.emit(time, carto.to_cartesian());
            }
        }
    }

    /// Pins an unplaced creation to the first position known at or after it,
    /// or to the scene origin when the object never moves.
    fn place_at_creation(&mut self, time: f64) {
        let position = self
            .samples
            .window(time, f64::INFINITY)
            .next()
            .map_or_else(|| self.scene.origin(), |sample| sample.position);
        self.samples.add_sample(time, position);
    }

    fn emit(&mut self, time: f64, position: Vec3) {
        self.samples.add_sample(time, position);
        self.last_emitted = time;
    }

    /// Copies the parent's samples inside `[since, last_decoded]`.
    fn flush_parent(&mut self) {
        let RunState::PendingParent { parent, since } = self.state else {
            return;
        };
        self.state = RunState::Idle;

        let Some(source) = (self.parent_samples)(parent) else {
            debug!(parent, "parent has no samples yet");
            return;
        };
        for sample in source.window(since, self.last_decoded) {
            self.emit(sample.time, sample.position);
        }
    }

    fn flush_pipe(&mut self) {
        let (from, to, samples) = match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::PendingPipe { from, to, samples } => (from, to, samples),
            other => {
                self.state = other;
                return;
            }
        };

        if samples.is_empty() {
            return;
        }
        let scene = self.scene;
        let Some(curve) = scene.pipe_curve(from, to) else {
            debug!(from, to, "no pipe between sites, discarding run");
            return;
        };

        if let [single] = samples.as_slice() {
            let u = lerp(
                curve.start_time(),
                curve.end_time(),
                ease(single.progress, self.ease_passes),
            );
            self.emit(single.time, curve.evaluate(u));
            return;
        }

        let run = self.pad_run(samples);
        let points = curve.points();
        let last_index = (points.len() - 1) as f64;

        for pair in run.windows(2) {
            let (s1, s2) = (pair[0], pair[1]);
            let mut selected: Vec<Vec3> = points
                .iter()
                .enumerate()
                .filter(|(j, _)| {
                    let fraction = *j as f64 / last_index;
                    fraction >= s1.progress && fraction <= s2.progress
                })
                .map(|(_, &p)| p)
                .collect();

            if selected.is_empty() {
                let fraction = (s1.progress + s2.progress) / 2.0;
                let index = (fraction * last_index).round().clamp(0.0, last_index) as usize;
                selected.push(points[index]);
            }

            if let [only] = selected.as_slice() {
                self.emit((s1.time + s2.time) / 2.0, *only);
                continue;
            }
            let denominator = (selected.len() - 1) as f64;
            for (k, point) in selected.into_iter().enumerate() {
                self.emit(lerp(s1.time, s2.time, k as f64 / denominator), point);
            }
        }
    }

    /// Adds synthetic progress 0 and progress 1 samples when the run does not
    /// observe the pipe ends. The ends are extrapolated from the average speed
    /// unless that would leave the window between the previous sample and the
    /// last decoded event, in which case the gap is bisected.
    fn pad_run(&self, mut run: Vec<PipeSample>) -> Vec<PipeSample> {
        let speed = |run: &[PipeSample]| {
            let (first, last) = (run[0], run[run.len() - 1]);
            (last.progress - first.progress) / (last.time - first.time)
        };

        if run[0].progress != 0.0 {
            let first = run[0];
            let zero_time = first.time - first.progress / speed(&run);
            let time = if zero_time.is_finite() && zero_time > self.last_emitted {
                zero_time
            } else {
                (self.last_emitted + first.time) / 2.0
            };
            run.insert(
                0,
                PipeSample {
                    time,
                    progress: 0.0,
                },
            );
        }

        if run[run.len() - 1].progress != 1.0 {
            let first = run[0];
            let last = run[run.len() - 1];
            let one_time = first.time + (1.0 - first.progress) / speed(&run);
            let time = if one_time.is_finite() && one_time < self.last_decoded {
                one_time
            } else {
                (last.time + self.last_decoded) / 2.0
            };
            run.push(PipeSample {
                time,
                progress: 1.0,
            });
        }

        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Cartographic;
    use crate::trajectory::Sample;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashMap;

    struct Scene {
        sites: HashMap<NodeId, Vec3>,
        curves: HashMap<(NodeId, NodeId), Curve>,
    }

    impl SceneLookup for Scene {
        fn node_position(&self, node: NodeId) -> Option<Vec3> {
            self.sites.get(&node).copied()
        }

        fn pipe_curve(&self, from: NodeId, to: NodeId) -> Option<&Curve> {
            self.curves.get(&(from, to))
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn at(seconds: f64) -> DateTime<Utc> {
        epoch() + Duration::milliseconds((seconds * 1000.0) as i64)
    }

    fn straight(points: usize) -> Curve {
        let times: Vec<f64> = (0..points).map(|i| i as f64 / (points - 1) as f64).collect();
        let positions = times.iter().map(|&t| Vec3::new(100.0 * t, 0.0, 0.0)).collect();
        Curve::linear(times, positions).unwrap()
    }

    fn scene() -> Scene {
        Scene {
            sites: HashMap::from([(1, Vec3::new(-50.0, 0.0, 0.0)), (2, Vec3::ZERO), (3, Vec3::new(100.0, 0.0, 0.0))]),
            curves: HashMap::from([((2, 3), straight(11))]),
        }
    }

    fn pipe(from: NodeId, to: NodeId, progress: f64) -> PackagePosition {
        PackagePosition::Pipe { from, to, progress }
    }

    fn replay(events: &[EventInfo], scene: &Scene) -> ReplayOutcome {
        replay_with_parents(events, scene, &HashMap::new())
    }

    fn replay_with_parents(
        events: &[EventInfo],
        scene: &Scene,
        parents: &HashMap<PackageId, SampledPosition>,
    ) -> ReplayOutcome {
        let seconds = |e: &EventInfo| (e.time - epoch()).num_milliseconds() as f64 / 1000.0;
        Replay::new(scene, |id| parents.get(&id), &TrajectoryConfig::default()).run(events, seconds)
    }

    #[test]
    fn full_pipe_run_spans_the_curve() {
        let events = vec![
            EventInfo::moved(at(0.0), 9, pipe(2, 3, 0.0)),
            EventInfo::moved(at(10.0), 9, pipe(2, 3, 1.0)),
        ];
        let outcome = replay(&events, &scene());
        let samples = outcome.samples;

        assert_eq!(samples.len(), 11);
        assert!(samples.times().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(samples.get(0).unwrap().position, Vec3::ZERO);
        assert_eq!(samples.get(0).unwrap().time, 0.0);
        assert_eq!(samples.get(10).unwrap().position, Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(samples.get(10).unwrap().time, 10.0);
    }

    #[test]
    fn two_point_curve_yields_both_endpoints() {
        let mut scene = scene();
        scene.curves.insert((2, 3), straight(2));
        let events = vec![
            EventInfo::moved(at(0.0), 9, pipe(2, 3, 0.0)),
            EventInfo::moved(at(10.0), 9, pipe(2, 3, 1.0)),
        ];
        let samples = replay(&events, &scene).samples;
        assert_eq!(samples.positions(), &[Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)]);
    }

    #[test]
    fn single_pipe_sample_sits_at_eased_progress() {
        let events = vec![EventInfo::moved(at(5.0), 9, pipe(2, 3, 0.5))];
        let samples = replay(&events, &scene()).samples;
        assert_eq!(samples.len(), 1);
        let sample = samples.get(0).unwrap();
        assert_eq!(sample.time, 5.0);
        assert_relative_eq!(sample.position.x, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn single_pipe_sample_is_eased() {
        let events = vec![EventInfo::moved(at(5.0), 9, pipe(2, 3, 0.25))];
        let samples = replay(&events, &scene()).samples;
        let expected = 100.0 * ease(0.25, 2);
        assert_relative_eq!(samples.get(0).unwrap().position.x, expected, epsilon = 1e-9);
    }

    #[test]
    fn creation_placement_is_the_only_sample() {
        let package = PackageInfo {
            name: "box".into(),
            position: Some(PackagePosition::Site { node_id: 1 }),
            ..Default::default()
        };
        let events = vec![EventInfo::new(at(0.0), 9, PackageEvent::Created { package })];
        let outcome = replay(&events, &scene());
        assert_eq!(outcome.info.unwrap().name, "box");
        assert_eq!(outcome.samples.len(), 1);
        assert_eq!(outcome.samples.get(0).unwrap().time, 0.0);
        assert_eq!(outcome.samples.get(0).unwrap().position, Vec3::new(-50.0, 0.0, 0.0));
    }

    #[test]
    fn child_inherits_parent_window() {
        let mut parent = SampledPosition::default();
        for t in 1..=4 {
            parent.add_sample(t as f64, Vec3::new(t as f64, 0.0, 0.0));
        }
        let parents = HashMap::from([(7, parent)]);
        let events = vec![
            EventInfo::moved(at(2.0), 9, PackagePosition::ParentPackage { parent_id: 7 }),
            EventInfo::new(at(4.0), 9, PackageEvent::Destroyed),
        ];
        let outcome = replay_with_parents(&events, &scene(), &parents);

        assert_eq!(outcome.samples.times(), &[2.0, 3.0, 4.0]);
        assert_eq!(outcome.samples.get(0).unwrap().position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(outcome.parents, BTreeSet::from([7]));
        assert_eq!(outcome.destroyed_at, Some(4.0));
    }

    #[test]
    fn parent_window_ends_at_next_move() {
        let mut parent = SampledPosition::default();
        for t in 0..=10 {
            parent.add_sample(t as f64, Vec3::new(t as f64, 1.0, 0.0));
        }
        let parents = HashMap::from([(7, parent)]);
        let events = vec![
            EventInfo::moved(at(2.0), 9, PackagePosition::ParentPackage { parent_id: 7 }),
            EventInfo::moved(at(5.5), 9, PackagePosition::Site { node_id: 1 }),
        ];
        let samples = replay_with_parents(&events, &scene(), &parents).samples;
        assert_eq!(samples.times(), &[2.0, 3.0, 4.0, 5.0, 5.5]);
        assert_eq!(samples.get(4).unwrap().position, Vec3::new(-50.0, 0.0, 0.0));
    }

    #[test]
    fn partial_run_is_padded_by_extrapolation() {
        // Halfway at t=10 and 3/4 at t=15: speed 0.05/s, so ends at t=0 and t=20.
        let events = vec![
            EventInfo::moved(at(-5.0), 9, PackagePosition::Site { node_id: 2 }),
            EventInfo::moved(at(10.0), 9, pipe(2, 3, 0.5)),
            EventInfo::moved(at(15.0), 9, pipe(2, 3, 0.75)),
            EventInfo::moved(at(30.0), 9, PackagePosition::Site { node_id: 3 }),
        ];
        let samples = replay(&events, &scene()).samples;

        let times = samples.times();
        assert_eq!(times[0], -5.0);
        assert_relative_eq!(times[1], 0.0, epsilon = 1e-9);
        assert_eq!(samples.get(1).unwrap().position, Vec3::ZERO);
        assert!(times.contains(&20.0));
        assert_eq!(samples.position_at(20.0), Some(Vec3::new(100.0, 0.0, 0.0)));
        assert_eq!(*times.last().unwrap(), 30.0);
    }

    #[test]
    fn padding_falls_back_to_bisection() {
        // Extrapolated zero time (t=0) is before the site sample at t=8,
        // so progress 0 is placed halfway between t=8 and t=10.
        let events = vec![
            EventInfo::moved(at(8.0), 9, PackagePosition::Site { node_id: 2 }),
            EventInfo::moved(at(10.0), 9, pipe(2, 3, 0.5)),
            EventInfo::moved(at(15.0), 9, pipe(2, 3, 0.75)),
        ];
        let samples = replay(&events, &scene()).samples;
        let times = samples.times();
        assert_eq!(times[0], 8.0);
        assert_relative_eq!(times[1], 9.0, epsilon = 1e-9);
        // The run ends the log, so progress 1 lands halfway to the last event.
        assert_relative_eq!(*times.last().unwrap(), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn changing_pipe_flushes_previous_run() {
        let mut scene = scene();
        scene.curves.insert((3, 2), {
            let times = vec![0.0, 1.0];
            Curve::linear(times, vec![Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO]).unwrap()
        });
        let events = vec![
            EventInfo::moved(at(0.0), 9, pipe(2, 3, 0.0)),
            EventInfo::moved(at(10.0), 9, pipe(2, 3, 1.0)),
            EventInfo::moved(at(20.0), 9, pipe(3, 2, 0.0)),
            EventInfo::moved(at(30.0), 9, pipe(3, 2, 1.0)),
        ];
        let samples = replay(&events, &scene).samples;
        assert_eq!(samples.position_at(10.0), Some(Vec3::new(100.0, 0.0, 0.0)));
        assert_eq!(samples.position_at(30.0), Some(Vec3::ZERO));
        assert_relative_eq!(samples.position_at(25.0).unwrap().x, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn run_without_pipe_is_discarded() {
        let events = vec![
            EventInfo::moved(at(0.0), 9, pipe(1, 3, 0.0)),
            EventInfo::moved(at(10.0), 9, pipe(1, 3, 1.0)),
        ];
        assert!(replay(&events, &scene()).samples.is_empty());
    }

    #[test]
    fn absolute_move_uses_geographic_position() {
        let carto = Cartographic::new(34.8, 32.1, 10.0);
        let events = vec![EventInfo::moved(at(3.0), 9, PackagePosition::Absolute { carto })];
        let samples = replay(&events, &scene()).samples;
        assert_eq!(samples.get(0).unwrap().position, carto.to_cartesian());
    }

    #[test]
    fn info_modified_overrides_created_info() {
        let created = PackageInfo {
            name: "before".into(),
            ..Default::default()
        };
        let modified = PackageInfo {
            name: "after".into(),
            ..Default::default()
        };
        let events = vec![
            EventInfo::new(at(0.0), 9, PackageEvent::Created { package: created }),
            EventInfo::new(at(1.0), 9, PackageEvent::InfoModified { package: modified }),
        ];
        let outcome = replay(&events, &scene());
        assert_eq!(outcome.info.unwrap().name, "after");
        assert_eq!(outcome.samples.len(), 1);
        assert_eq!(outcome.samples.get(0).unwrap().time, 0.0);
    }

    #[test]
    fn unplaced_creation_sits_at_scene_origin() {
        let package = PackageInfo {
            name: "x".into(),
            ..Default::default()
        };
        let events = vec![EventInfo::new(at(0.0), 9, PackageEvent::Created { package })];
        let samples = replay(&events, &scene()).samples;
        assert_eq!(samples.len(), 1);
        assert_eq!(samples.get(0).unwrap(), Sample { time: 0.0, position: Vec3::ZERO });
    }

    #[test]
    fn unplaced_creation_holds_first_known_position() {
        let package = PackageInfo::default();
        let events = vec![
            EventInfo::new(at(0.0), 9, PackageEvent::Created { package }),
            EventInfo::moved(at(4.0), 9, PackagePosition::Site { node_id: 3 }),
            EventInfo::moved(at(8.0), 9, PackagePosition::Site { node_id: 1 }),
        ];
        let samples = replay(&events, &scene()).samples;
        assert_eq!(samples.times(), &[0.0, 4.0, 8.0]);
        assert_eq!(samples.positions()[0], Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(samples.position_at(2.0), Some(Vec3::new(100.0, 0.0, 0.0)));
    }
}
