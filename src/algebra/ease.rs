/// Cubic Hermite smoothstep on `[0, 1]`.
pub fn hermite(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Interpolates from `x` to `y` with one smoothstep pass applied to `t`.
pub fn hermite_lerp(x: f64, y: f64, t: f64) -> f64 {
    x - hermite(t) * (x - y)
}

/// Interpolates from `x` to `y` after applying `passes` nested smoothstep passes to `t`.
///
/// Each pass flattens the curve further at both ends while keeping 0, 0.5 and 1 fixed.
pub fn multi_hermite_lerp(x: f64, y: f64, t: f64, passes: u32) -> f64 {
    let mut t = t;
    for _ in 0..passes {
        t = hermite(t);
    }
    x - t * (x - y)
}

/// `multi_hermite_lerp(0, 1, t, passes)`: remaps a progress value along a pipe.
pub fn ease(t: f64, passes: u32) -> f64 {
    multi_hermite_lerp(0.0, 1.0, t, passes)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
