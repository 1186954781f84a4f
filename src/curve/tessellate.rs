use super::Curve;
use crate::algebra::{multi_hermite_lerp, Vec3};
use crate::error::{Error, Result};

/// Bisection depth limit. Well beyond what any sane tolerance needs.
const MAX_DEPTH: u32 = 24;

/// Adaptive polyline approximation of `curve`.
///
/// The allowed deviation blends from `mid_tolerance` at the middle of the
/// parameter range to `end_tolerance` at both ends. An interval is split
/// while its chord midpoint is at least the local tolerance away from the
/// curve. The exact start and end points are always included.
pub fn curve_to_polyline(curve: &Curve, end_tolerance: f64, mid_tolerance: f64) -> Result<Vec<Vec3>> {
    if end_tolerance.is_nan() || mid_tolerance.is_nan() {
        return Err(Error::NanTolerance);
    }

    let start_time = curve.start_time();
    let end_time = curve.end_time();
    let start = curve.evaluate(start_time);
    let end = curve.evaluate(end_time);

    let mut polyline = vec![start];
    let tessellator = Tessellator {
        curve,
        mid_time: (start_time + end_time) / 2.0,
        half_span: (end_time - start_time) / 2.0,
        end_tolerance,
        mid_tolerance,
    };
    tessellator.subdivide(start, start_time, end, end_time, 0, &mut polyline)?;
    polyline.push(end);
    Ok(polyline)
}

struct Tessellator<'a> {
    curve: &'a Curve,
    mid_time: f64,
    half_span: f64,
    end_tolerance: f64,
    mid_tolerance: f64,
}

impl Tessellator<'_> {
    fn tolerance_at(&self, t: f64) -> f64 {
        let from_middle = (t - self.mid_time).abs() / self.half_span;
        multi_hermite_lerp(self.mid_tolerance, self.end_tolerance, from_middle, 2)
    }

    fn subdivide(
        &self,
        p1: Vec3,
        t1: f64,
        p2: Vec3,
        t2: f64,
        depth: u32,
        out: &mut Vec<Vec3>,
    ) -> Result<()> {
        if depth >= MAX_DEPTH {
            return Ok(());
        }

        let middle_t = (t1 + t2) / 2.0;
        let approx = p1.lerp(p2, 0.5);
        let real = self.curve.evaluate(middle_t);
        if !real.is_finite() {
            return Err(Error::NonFiniteInput);
        }

        let tolerance = self.tolerance_at(middle_t);
        if approx.distance_squared(real) < tolerance * tolerance {
            return Ok(());
        }

        self.subdivide(p1, t1, real, middle_t, depth + 1, out)?;
        out.push(real);
        self.subdivide(real, middle_t, p2, t2, depth + 1, out)
    }
}
