use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// 3D vector with f64 components.
///
/// Earth-fixed coordinates reach ~6.4e6 m, so single precision is not enough.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < f64::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / mag)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).magnitude_squared()
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// 3x3 matrix stored as three column vectors.
///
/// Serialized as nine numbers in column-major order, so `[c0.x, c0.y, c0.z, c1.x, ...]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 9]", into = "[f64; 9]")]
pub struct Matrix3 {
    pub c0: Vec3,
    pub c1: Vec3,
    pub c2: Vec3,
}

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        c0: Vec3::UNIT_X,
        c1: Vec3::UNIT_Y,
        c2: Vec3::UNIT_Z,
    };

    pub fn from_columns(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { c0, c1, c2 }
    }

    pub fn from_column_major(m: [f64; 9]) -> Self {
        Self {
            c0: Vec3::new(m[0], m[1], m[2]),
            c1: Vec3::new(m[3], m[4], m[5]),
            c2: Vec3::new(m[6], m[7], m[8]),
        }
    }

    pub fn to_column_major(&self) -> [f64; 9] {
        [
            self.c0.x, self.c0.y, self.c0.z, self.c1.x, self.c1.y, self.c1.z, self.c2.x,
            self.c2.y, self.c2.z,
        ]
    }

    /// Counter-clockwise rotation about +X, right-handed.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_columns(Vec3::UNIT_X, Vec3::new(0.0, c, s), Vec3::new(0.0, -s, c))
    }

    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_columns(Vec3::new(c, 0.0, -s), Vec3::UNIT_Y, Vec3::new(s, 0.0, c))
    }

    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_columns(Vec3::new(c, s, 0.0), Vec3::new(-s, c, 0.0), Vec3::UNIT_Z)
    }

    pub fn transpose(&self) -> Self {
        Self {
            c0: Vec3::new(self.c0.x, self.c1.x, self.c2.x),
            c1: Vec3::new(self.c0.y, self.c1.y, self.c2.y),
            c2: Vec3::new(self.c0.z, self.c1.z, self.c2.z),
        }
    }

    /// Returns `self * other`, i.e. `other` is applied first.
    pub fn multiply(&self, other: &Matrix3) -> Self {
        Self {
            c0: self.multiply_vector(other.c0),
            c1: self.multiply_vector(other.c1),
            c2: self.multiply_vector(other.c2),
        }
    }

    pub fn multiply_vector(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.c0.x * v.x + self.c1.x * v.y + self.c2.x * v.z,
            self.c0.y * v.x + self.c1.y * v.y + self.c2.y * v.z,
            self.c0.z * v.x + self.c1.z * v.y + self.c2.z * v.z,
        )
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 9]> for Matrix3 {
    fn from(m: [f64; 9]) -> Self {
        Self::from_column_major(m)
    }
}

impl From<Matrix3> for [f64; 9] {
    fn from(m: Matrix3) -> Self {
        m.to_column_major()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn normalize_yields_unit_length() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let normalized = v.normalize();
        assert_relative_eq!(normalized.x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(normalized.y, 0.8, epsilon = 1e-12);
        assert_relative_eq!(normalized.magnitude(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let c = Vec3::UNIT_X.cross(Vec3::UNIT_Y);
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_z_quarter_turn() {
        let rotated = Matrix3::rotation_z(PI / 2.0).multiply_vector(Vec3::UNIT_X);
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn matrix_multiplication_order() {
        let rx = Matrix3::rotation_x(PI / 6.0);
        let ry = Matrix3::rotation_y(PI / 4.0);
        let v = Vec3::new(0.3, -1.0, 2.0);

        let combined = ry.multiply(&rx).multiply_vector(v);
        let sequential = ry.multiply_vector(rx.multiply_vector(v));

        assert_relative_eq!(combined.x, sequential.x, epsilon = 1e-12);
        assert_relative_eq!(combined.y, sequential.y, epsilon = 1e-12);
        assert_relative_eq!(combined.z, sequential.z, epsilon = 1e-12);
    }

    #[test]
    fn transpose_inverts_rotation() {
        let r = Matrix3::rotation_y(0.7);
        let back = r.transpose().multiply(&r);
        assert_eq!(back.to_column_major().len(), 9);
        for (a, b) in back
            .to_column_major()
            .iter()
            .zip(Matrix3::IDENTITY.to_column_major().iter())
        {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn matrix_serializes_column_major() {
        let m: Matrix3 = serde_json::from_str("[1,2,3,4,5,6,7,8,9]").unwrap();
        assert_eq!(m.c1, Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(serde_json::to_string(&m).unwrap(), "[1.0,2.0,3.0,4.0,5.0,6.0,7.0,8.0,9.0]");
    }
}
