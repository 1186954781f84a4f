//! Pure math primitives: vectors, rotations, transforms, easing and geodesy.
//!
//! This module has no dependencies on the rest of the crate.

mod ease;
mod math;
mod transform;

pub mod geo;

pub use ease::{ease, hermite, hermite_lerp, lerp, multi_hermite_lerp};
pub use geo::Cartographic;
pub use math::{Matrix3, Vec3};
pub use transform::Transform;
