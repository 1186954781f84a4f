//! Parametrized 3D curves: construction for pipes, memoization and tessellation.

mod builder;
mod cache;
mod tessellate;

pub use builder::{arc_curve, build_pipe_curve, explicit_curve, finesse, offset_laterally};
pub use cache::PipeCurveCache;
pub use tessellate::curve_to_polyline;

use crate::algebra::Vec3;
use crate::error::{Error, Result};

/// Evaluation rule between control points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    /// Polynomial through a window of `degree + 1` neighbouring control points.
    Polynomial { degree: usize },
}

/// Control points with strictly increasing knot times, evaluable anywhere in
/// `[start_time, end_time]`. Queries outside that interval are clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    times: Vec<f64>,
    points: Vec<Vec3>,
    interpolation: Interpolation,
}

impl Curve {
    pub fn new(times: Vec<f64>, points: Vec<Vec3>, interpolation: Interpolation) -> Result<Self> {
        if times.len() != points.len() {
            return Err(Error::MismatchedKnots {
                times: times.len(),
                points: points.len(),
            });
        }
        if points.len() < 2 {
            return Err(Error::TooFewPoints(points.len()));
        }
        if times.iter().any(|t| !t.is_finite()) || points.iter().any(|p| !p.is_finite()) {
            return Err(Error::NonFiniteInput);
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::UnorderedKnots);
        }

        let interpolation = match interpolation {
            Interpolation::Polynomial { degree } if degree <= 1 => Interpolation::Linear,
            other => other,
        };

        Ok(Self {
            times,
            points,
            interpolation,
        })
    }

    pub fn linear(times: Vec<f64>, points: Vec<Vec3>) -> Result<Self> {
        Self::new(times, points, Interpolation::Linear)
    }

    pub fn polynomial(times: Vec<f64>, points: Vec<Vec3>, degree: usize) -> Result<Self> {
        Self::new(times, points, Interpolation::Polynomial { degree })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_time(&self) -> f64 {
        self.times[0]
    }

    pub fn end_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn first_point(&self) -> Vec3 {
        self.points[0]
    }

    pub fn last_point(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }

    /// Straight-line distance between the first and last control points.
    pub fn chord_length(&self) -> f64 {
        self.first_point().distance(self.last_point())
    }

    pub fn evaluate(&self, t: f64) -> Vec3 {
        interpolate(&self.times, &self.points, self.interpolation, t)
    }
}

/// Evaluates control points at `t`, clamping to the first and last point.
///
/// `times` must be strictly increasing, non-empty and as long as `points`.
/// A NaN `t` yields the first point.
pub(crate) fn interpolate(times: &[f64], points: &[Vec3], interpolation: Interpolation, t: f64) -> Vec3 {
    let last = times.len() - 1;
    if t.is_nan() || t <= times[0] {
        return points[0];
    }
    if t >= times[last] {
        return points[last];
    }

    match interpolation {
        Interpolation::Linear => interpolate_linear(times, points, t),
        Interpolation::Polynomial { degree } => interpolate_polynomial(times, points, t, degree),
    }
}

fn interpolate_linear(times: &[f64], points: &[Vec3], t: f64) -> Vec3 {
    // Binary search to find segment [lo, lo+1] where times[lo] <= t < times[lo+1]
    let mut lo = 0usize;
    let mut hi = times.len() - 1;
    while lo < hi - 1 {
        let mid = (lo + hi) / 2;
        if times[mid] <= t {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let seg_len = times[lo + 1] - times[lo];
    let u = (t - times[lo]) / seg_len;
    points[lo].lerp(points[lo + 1], u)
}

fn interpolate_polynomial(times: &[f64], points: &[Vec3], t: f64, degree: usize) -> Vec3 {
    let last = times.len() - 1;
    let degree = degree.min(last);

    // First knot strictly after t.
    let upper = times.partition_point(|&knot| knot <= t);
    if times[upper - 1] == t {
        return points[upper - 1];
    }

    let mut first = upper.saturating_sub(degree / 2 + 1);
    if first + degree > last {
        first = last - degree;
    }
    let window = first..=first + degree;

    lagrange(&times[window.clone()], &points[window], t)
}

fn lagrange(times: &[f64], points: &[Vec3], t: f64) -> Vec3 {
    let mut result = Vec3::ZERO;
    for (i, (&ti, &pi)) in times.iter().zip(points).enumerate() {
        let mut weight = 1.0;
        for (j, &tj) in times.iter().enumerate() {
            if i != j {
                weight *= (t - tj) / (ti - tj);
            }
        }
        result = result + pi * weight;
    }
    result
}
