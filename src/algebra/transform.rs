use super::geo::geodetic_surface_normal;
use super::math::{Matrix3, Vec3};
use serde::{Deserialize, Serialize};

/// Uniform scale, then rotation, then translation.
///
/// `rotation` is expected to be orthonormal; [`Transform::invert`] relies on it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub scale: f64,
    pub rotation: Matrix3,
    pub offset: Vec3,
}

impl Transform {
    pub const fn new(scale: f64, rotation: Matrix3, offset: Vec3) -> Self {
        Self {
            scale,
            rotation,
            offset,
        }
    }

    pub const IDENTITY: Self = Self::new(1.0, Matrix3::IDENTITY, Vec3::ZERO);

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn scale(scale: f64) -> Self {
        Self::new(scale, Matrix3::IDENTITY, Vec3::ZERO)
    }

    pub fn translation(offset: Vec3) -> Self {
        Self::new(1.0, Matrix3::IDENTITY, offset)
    }

    pub fn rotation(rotation: Matrix3) -> Self {
        Self::new(1.0, rotation, Vec3::ZERO)
    }

    pub fn rotation_x(angle: f64) -> Self {
        Self::rotation(Matrix3::rotation_x(angle))
    }

    pub fn rotation_y(angle: f64) -> Self {
        Self::rotation(Matrix3::rotation_y(angle))
    }

    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation(Matrix3::rotation_z(angle))
    }

    /// Local east-north-up tangent frame anchored at an earth-fixed point.
    ///
    /// Columns of the rotation are east, north and up. At the poles (and the
    /// earth centre) east is taken as +Y.
    pub fn east_north_up(origin: Vec3) -> Self {
        let on_axis = origin.x.abs() < 1e-9 && origin.y.abs() < 1e-9;
        let (east, up) = if on_axis {
            let sign = if origin.z < 0.0 { -1.0 } else { 1.0 };
            (Vec3::UNIT_Y, Vec3::new(0.0, 0.0, sign))
        } else {
            let up = geodetic_surface_normal(origin);
            (Vec3::new(-origin.y, origin.x, 0.0).normalize(), up)
        };
        let north = up.cross(east);
        Self::new(1.0, Matrix3::from_columns(east, north, up), origin)
    }

    /// Scales, rotates, then translates `v`.
    pub fn apply(&self, v: Vec3) -> Vec3 {
        self.rotation.multiply_vector(v * self.scale) + self.offset
    }

    /// The transform equivalent to applying `first`, then `second`.
    pub fn combine(first: &Transform, second: &Transform) -> Self {
        Self {
            scale: first.scale * second.scale,
            rotation: second.rotation.multiply(&first.rotation),
            offset: second.apply(first.offset),
        }
    }

    /// Folds `combine` left to right. Empty input yields the identity.
    pub fn combine_many(transforms: &[Transform]) -> Self {
        transforms
            .iter()
            .fold(Self::IDENTITY, |acc, t| Self::combine(&acc, t))
    }

    /// Inverse of a transform with an orthonormal rotation.
    pub fn invert(&self) -> Self {
        let scale = 1.0 / self.scale;
        let rotation = self.rotation.transpose();
        let offset = -(rotation.multiply_vector(self.offset) * scale);
        Self::new(scale, rotation, offset)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
