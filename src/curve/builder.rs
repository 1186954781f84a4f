use std::f64::consts::PI;

use super::{Curve, Interpolation};
use crate::algebra::{ease, geo, lerp, Cartographic, Vec3};
use crate::config::CurveConfig;
use crate::error::{Error, Result};
use crate::scene::{Pipe, PipeDirection, PipeKind, SpatialTree};

/// Squared length below which the averaged side vector is considered degenerate.
const SIDE_EPSILON: f64 = 1e-8;

/// Builds the display curve for one direction of a pipe: the raw geometry,
/// resampled with eased spacing, then pushed sideways so the two directions
/// of a bidirectional pipe do not overlap.
pub fn build_pipe_curve(
    tree: &SpatialTree,
    pipe: &Pipe,
    direction: PipeDirection,
    config: &CurveConfig,
) -> Result<Curve> {
    let (start_id, end_id) = pipe.endpoints(direction);
    let start = tree.position(start_id).ok_or(Error::UnknownNode(start_id))?;
    let end = tree.position(end_id).ok_or(Error::UnknownNode(end_id))?;

    let raw = match &pipe.kind {
        PipeKind::Arc => arc_curve(start, end, config.arc_height_fraction)?,
        PipeKind::Line => arc_curve(start, end, 0.0)?,
        PipeKind::Explicit(path) => {
            let backward = direction == PipeDirection::Backward;
            let mut points = vec![start];

            let mut components: Vec<_> = path.components.iter().collect();
            if backward {
                components.reverse();
            }
            for component in components {
                let frame = tree
                    .node(component.node)
                    .ok_or(Error::UnknownNode(component.node))?
                    .absolute;
                let local: Vec<Vec3> = if backward {
                    component.points.iter().rev().copied().collect()
                } else {
                    component.points.clone()
                };
                points.extend(local.into_iter().map(|p| frame.apply(p)));
            }

            points.push(end);
            explicit_curve(points, path.degree, config.min_knot_spacing)?
        }
    };

    let amount = raw.chord_length() * config.offset_fraction;
    let resampled = finesse(&raw, config.resample_points, config.ease_passes)?;
    offset_laterally(&resampled, amount)
}

/// Quadratic curve through both endpoints and their great-circle midpoint,
/// lifted to `height_fraction` of the surface distance.
pub fn arc_curve(from: Vec3, to: Vec3, height_fraction: f64) -> Result<Curve> {
    if !from.distance_squared(to).is_finite() {
        return Err(Error::NonFiniteInput);
    }

    let c1 = Cartographic::from_cartesian(from).ok_or(Error::DegenerateArc)?;
    let c3 = Cartographic::from_cartesian(to).ok_or(Error::DegenerateArc)?;
    let (mid, distance) = geo::great_circle_midpoint(c1, c3).ok_or(Error::DegenerateArc)?;
    let apex = Cartographic::new(mid.longitude, mid.latitude, distance * height_fraction);

    Curve::polynomial(vec![0.0, 0.5, 1.0], vec![from, apex.to_cartesian(), to], 2)
}

/// Curve through `points` with knots proportional to cumulative chord length.
///
/// Every chord counts for at least `min_spacing`, so repeated waypoints still
/// get distinct knots. Degree 1 yields a piecewise-linear curve.
pub fn explicit_curve(points: Vec<Vec3>, degree: usize, min_spacing: f64) -> Result<Curve> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(Error::NonFiniteInput);
    }
    if points.len() < 2 {
        return Err(Error::TooFewPoints(points.len()));
    }

    let chords: Vec<f64> = points
        .windows(2)
        .map(|w| w[0].distance(w[1]).max(min_spacing))
        .collect();
    let total: f64 = chords.iter().sum();

    let mut times = Vec::with_capacity(points.len());
    times.push(0.0);
    let mut accumulated = 0.0;
    for chord in &chords[..chords.len() - 1] {
        accumulated += chord;
        times.push(accumulated / total);
    }
    times.push(1.0);

    let interpolation = if degree <= 1 {
        Interpolation::Linear
    } else {
        Interpolation::Polynomial { degree }
    };
    Curve::new(times, points, interpolation)
}

/// Resamples `curve` at `count` parameters spread by `passes` smoothstep passes,
/// which packs samples towards both ends. The result is quadratic.
pub fn finesse(curve: &Curve, count: usize, passes: u32) -> Result<Curve> {
    let count = count.max(2);
    let start = curve.start_time();
    let end = curve.end_time();

    let mut times = Vec::with_capacity(count);
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let t = lerp(start, end, ease(i as f64 / (count - 1) as f64, passes));
        times.push(t);
        points.push(curve.evaluate(t));
    }

    Curve::polynomial(times, points, 2)
}

/// Displaces interior control points sideways by `amount · sin(π·u)`, where `u`
/// is the normalized knot time. Endpoints stay put.
///
/// "Sideways" is the average of the incoming and outgoing segment directions
/// crossed with the earth-fixed up vector; when that cancels out the incoming
/// direction is used instead.
pub fn offset_laterally(curve: &Curve, amount: f64) -> Result<Curve> {
    let times = curve.times();
    let source = curve.points();
    let span = curve.end_time() - curve.start_time();
    let mut points = source.to_vec();

    for i in 1..source.len() - 1 {
        let (p1, p2, p3) = (source[i - 1], source[i], source[i + 1]);
        let up = p2.normalize();
        let incoming = p2 - p1;
        let outgoing = p3 - p2;
        let side = incoming
            .cross(up)
            .normalize()
            .lerp(outgoing.cross(up).normalize(), 0.5);
        let side = if side.magnitude_squared() > SIDE_EPSILON {
            side.normalize()
        } else {
            incoming.normalize()
        };

        let u = (times[i] - curve.start_time()) / span;
        points[i] = p2 + side * (amount * (PI * u).sin());
    }

    Curve::new(times.to_vec(), points, curve.interpolation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{
        GeoPathComponentInfo, GeoPathInfo, NodeTransformInfo, PathInterpolation, PipeInfo,
        PipeKindInfo, SpatialNodeInfo,
    };
    use approx::assert_relative_eq;
    use serde_json::Value;

    fn site(id: u32, longitude: f64, latitude: f64) -> SpatialNodeInfo {
        SpatialNodeInfo {
            id,
            name: format!("site {id}"),
            transform: NodeTransformInfo::cartographic(Cartographic::new(longitude, latitude, 0.0)),
            expand_distance: 0.0,
            children: Vec::new(),
            site: None,
            pipes: Vec::new(),
            collapsed_visuals: Vec::new(),
            expanded_visuals: Vec::new(),
            custom_props: Value::Null,
        }
    }

    fn pipe(kind: PipeKindInfo) -> PipeInfo {
        PipeInfo {
            from_node_id: 2,
            to_node_id: 3,
            bi_directional: true,
            width: 1.0,
            kind,
            explicit_path: None,
            custom_props: Value::Null,
        }
    }

    fn two_sites(pipe: PipeInfo) -> SpatialTree {
        let mut root = site(1, 0.0, 0.0);
        root.children = vec![site(2, 10.0, 0.0), site(3, 12.0, 0.0)];
        root.pipes.push(pipe);
        SpatialTree::build(&root).unwrap()
    }

    #[test]
    fn arc_apex_is_raised_by_fraction_of_distance() {
        let from = Cartographic::new(0.0, 0.0, 0.0).to_cartesian();
        let to = Cartographic::new(1.0, 0.0, 0.0).to_cartesian();
        let curve = arc_curve(from, to, 1.0 / 8.0).unwrap();

        let distance = 1.0_f64.to_radians() * geo::MEAN_RADIUS;
        let apex = Cartographic::from_cartesian(curve.evaluate(0.5)).unwrap();
        assert_relative_eq!(apex.longitude, 0.5, epsilon = 1e-9);
        assert_relative_eq!(apex.height, distance / 8.0, epsilon = 1e-3);
    }

    #[test]
    fn arc_keeps_exact_endpoints() {
        let from = Cartographic::new(34.0, 31.0, 0.0).to_cartesian();
        let to = Cartographic::new(35.0, 32.0, 0.0).to_cartesian();
        let curve = arc_curve(from, to, 0.0).unwrap();
        assert_eq!(curve.first_point(), from);
        assert_eq!(curve.last_point(), to);
    }

    #[test]
    fn arc_rejects_nan_and_centre() {
        let to = Cartographic::new(1.0, 0.0, 0.0).to_cartesian();
        assert!(matches!(
            arc_curve(Vec3::new(f64::NAN, 0.0, 0.0), to, 0.125),
            Err(Error::NonFiniteInput)
        ));
        assert!(matches!(arc_curve(Vec3::ZERO, to, 0.125), Err(Error::DegenerateArc)));
    }

    #[test]
    fn explicit_knots_follow_chord_length() {
        let points = vec![
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(40.0, 0.0, 0.0),
        ];
        let curve = explicit_curve(points, 1, 0.01).unwrap();
        let total = 10.0 + 0.01 + 30.0;
        assert_relative_eq!(curve.times()[1], 10.0 / total, epsilon = 1e-12);
        assert_relative_eq!(curve.times()[2], 10.01 / total, epsilon = 1e-12);
        assert_eq!(curve.times()[3], 1.0);
        assert_eq!(curve.interpolation(), Interpolation::Linear);
    }

    #[test]
    fn explicit_curve_uses_requested_degree() {
        let points = vec![Vec3::ZERO, Vec3::UNIT_X, Vec3::new(2.0, 1.0, 0.0), Vec3::UNIT_Z];
        let curve = explicit_curve(points, 3, 0.01).unwrap();
        assert_eq!(curve.interpolation(), Interpolation::Polynomial { degree: 3 });
    }

    #[test]
    fn explicit_curve_rejects_nan() {
        let points = vec![Vec3::ZERO, Vec3::new(0.0, f64::NAN, 0.0)];
        assert!(matches!(explicit_curve(points, 1, 0.01), Err(Error::NonFiniteInput)));
    }

    #[test]
    fn finesse_packs_samples_towards_the_ends() {
        let curve = Curve::linear(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)]).unwrap();
        let fine = finesse(&curve, 129, 2).unwrap();
        assert_eq!(fine.len(), 129);
        assert_eq!(fine.times()[64], 0.5);
        let first_gap = fine.times()[1] - fine.times()[0];
        let middle_gap = fine.times()[65] - fine.times()[64];
        assert!(first_gap < middle_gap / 100.0);
        assert_relative_eq!(fine.evaluate(0.3).x, 30.0, epsilon = 1e-6);
    }

    #[test]
    fn offset_keeps_endpoints_and_peaks_in_the_middle() {
        let base = Cartographic::new(0.0, 0.0, 0.0).to_cartesian();
        let points: Vec<Vec3> = (0..5)
            .map(|i| base + Vec3::new(0.0, i as f64 * 10.0, 0.0))
            .collect();
        let curve = Curve::linear(vec![0.0, 0.25, 0.5, 0.75, 1.0], points.clone()).unwrap();
        let shifted = offset_laterally(&curve, 2.0).unwrap();

        assert_eq!(shifted.first_point(), points[0]);
        assert_eq!(shifted.last_point(), points[4]);
        assert_relative_eq!(shifted.points()[2].distance(points[2]), 2.0, epsilon = 1e-9);
        assert_relative_eq!(
            shifted.points()[1].distance(points[1]),
            2.0 * (PI / 4.0).sin(),
            epsilon = 1e-9
        );
        // Travelling along +Y with +X up: the side vector is +Y x +X = -Z.
        assert!(shifted.points()[2].z < 0.0);
    }

    #[test]
    fn opposite_directions_separate() {
        let tree = two_sites(pipe(PipeKindInfo::Arc));
        let pipe = &tree.pipes()[0];
        let config = CurveConfig::default();
        let forward = build_pipe_curve(&tree, pipe, PipeDirection::Forward, &config).unwrap();
        let backward = build_pipe_curve(&tree, pipe, PipeDirection::Backward, &config).unwrap();

        assert_eq!(forward.len(), config.resample_points);
        assert_eq!(forward.first_point(), backward.last_point());
        assert_eq!(forward.last_point(), backward.first_point());

        let amount = forward.chord_length() * config.offset_fraction;
        let gap = forward.evaluate(0.5).distance(backward.evaluate(0.5));
        assert_relative_eq!(gap, 2.0 * amount, max_relative = 1e-3);
    }

    #[test]
    fn explicit_pipe_reverses_waypoints_backwards() {
        let mut info = pipe(PipeKindInfo::Explicit);
        info.explicit_path = Some(GeoPathInfo {
            interpolation_type: PathInterpolation::Linear,
            components: vec![
                GeoPathComponentInfo {
                    node_id: 2,
                    points: vec![Vec3::new(1_000.0, 0.0, 0.0)],
                },
                GeoPathComponentInfo {
                    node_id: 3,
                    points: vec![Vec3::new(-1_000.0, 0.0, 0.0)],
                },
            ],
        });
        let tree = two_sites(info);
        let pipe = &tree.pipes()[0];
        let config = CurveConfig {
            offset_fraction: 0.0,
            ..CurveConfig::default()
        };

        let forward = build_pipe_curve(&tree, pipe, PipeDirection::Forward, &config).unwrap();
        let backward = build_pipe_curve(&tree, pipe, PipeDirection::Backward, &config).unwrap();

        // Same physical path, travelled in opposite order.
        for u in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let a = forward.evaluate(u);
            let b = backward.evaluate(1.0 - u);
            assert!(a.distance(b) < 1_000.0, "u = {u}, gap = {}", a.distance(b));
        }
        let waypoint = tree.node(2).unwrap().absolute.apply(Vec3::new(1_000.0, 0.0, 0.0));
        let nearest = forward
            .points()
            .iter()
            .map(|p| p.distance(waypoint))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest < 1_000.0);
    }
}
