//! WGS84 geodesy: geographic degrees <-> earth-fixed Cartesian, plus great-circle helpers.

use super::math::Vec3;
use serde::{Deserialize, Serialize};

pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;
pub const WGS84_SEMI_MINOR: f64 = 6_356_752.314_245_179;
/// IUGG mean earth radius, used for great-circle surface distances.
pub const MEAN_RADIUS: f64 = 6_371_008.8;

const ECCENTRICITY_SQUARED: f64 =
    1.0 - (WGS84_SEMI_MINOR * WGS84_SEMI_MINOR) / (WGS84_SEMI_MAJOR * WGS84_SEMI_MAJOR);

/// Points closer than this to the earth centre have no geographic position.
const CENTER_EPSILON: f64 = 1e-3;

/// Geographic position: longitude and latitude in degrees, height in meters above the ellipsoid.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cartographic {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub height: f64,
}

impl Cartographic {
    pub const fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// Converts to earth-fixed Cartesian coordinates on the WGS84 ellipsoid.
    pub fn to_cartesian(self) -> Vec3 {
        let lon = self.longitude.to_radians();
        let lat = self.latitude.to_radians();
        let normal = geodetic_normal(lon, lat);
        let k = Vec3::new(
            WGS84_SEMI_MAJOR * WGS84_SEMI_MAJOR * normal.x,
            WGS84_SEMI_MAJOR * WGS84_SEMI_MAJOR * normal.y,
            WGS84_SEMI_MINOR * WGS84_SEMI_MINOR * normal.z,
        );
        let gamma = normal.dot(k).sqrt();
        k * (1.0 / gamma) + normal * self.height
    }

    /// Inverse of [`Cartographic::to_cartesian`]. Returns `None` at the earth centre
    /// or for non-finite input.
    pub fn from_cartesian(p: Vec3) -> Option<Self> {
        if !p.is_finite() || p.magnitude() < CENTER_EPSILON {
            return None;
        }

        let horizontal = (p.x * p.x + p.y * p.y).sqrt();
        let lon = p.y.atan2(p.x);

        if horizontal < CENTER_EPSILON {
            let lat = if p.z >= 0.0 { 90.0 } else { -90.0 };
            return Some(Self::new(lon.to_degrees(), lat, p.z.abs() - WGS84_SEMI_MINOR));
        }

        let mut lat = p.z.atan2(horizontal * (1.0 - ECCENTRICITY_SQUARED));
        let mut height = 0.0;
        for _ in 0..8 {
            let sin_lat = lat.sin();
            let n = WGS84_SEMI_MAJOR / (1.0 - ECCENTRICITY_SQUARED * sin_lat * sin_lat).sqrt();
            height = horizontal / lat.cos() - n;
            lat = p
                .z
                .atan2(horizontal * (1.0 - ECCENTRICITY_SQUARED * n / (n + height)));
        }

        Some(Self::new(lon.to_degrees(), lat.to_degrees(), height))
    }
}

/// Outward surface normal of the ellipsoid at the given geodetic longitude/latitude (radians).
pub fn geodetic_normal(lon: f64, lat: f64) -> Vec3 {
    let cos_lat = lat.cos();
    Vec3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

/// Outward surface normal of the ellipsoid below an earth-fixed point.
pub fn geodetic_surface_normal(p: Vec3) -> Vec3 {
    let a2 = WGS84_SEMI_MAJOR * WGS84_SEMI_MAJOR;
    let b2 = WGS84_SEMI_MINOR * WGS84_SEMI_MINOR;
    Vec3::new(p.x / a2, p.y / a2, p.z / b2).normalize()
}

/// Great-circle midpoint (at height 0) and surface distance between two geographic positions.
///
/// Returns `None` for antipodal pairs, whose midpoint is undefined.
pub fn great_circle_midpoint(from: Cartographic, to: Cartographic) -> Option<(Cartographic, f64)> {
    let u = geodetic_normal(from.longitude.to_radians(), from.latitude.to_radians());
    let v = geodetic_normal(to.longitude.to_radians(), to.latitude.to_radians());

    let sum = u + v;
    if sum.magnitude() < 1e-12 {
        return None;
    }

    let angle = u.cross(v).magnitude().atan2(u.dot(v));
    let mid = sum.normalize();
    let mid_lat = mid.z.clamp(-1.0, 1.0).asin();
    let mid_lon = mid.y.atan2(mid.x);

    Some((
        Cartographic::new(mid_lon.to_degrees(), mid_lat.to_degrees(), 0.0),
        angle * MEAN_RADIUS,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equator_prime_meridian_is_on_x_axis() {
        let p = Cartographic::new(0.0, 0.0, 0.0).to_cartesian();
        assert_relative_eq!(p.x, WGS84_SEMI_MAJOR, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn north_pole_is_on_minor_axis() {
        let p = Cartographic::new(0.0, 90.0, 100.0).to_cartesian();
        assert_relative_eq!(p.z, WGS84_SEMI_MINOR + 100.0, epsilon = 1e-6);
    }

    #[test]
    fn cartesian_round_trip() {
        let original = Cartographic::new(34.78, 32.08, 250.0);
        let back = Cartographic::from_cartesian(original.to_cartesian()).unwrap();
        assert_relative_eq!(back.longitude, original.longitude, epsilon = 1e-9);
        assert_relative_eq!(back.latitude, original.latitude, epsilon = 1e-9);
        assert_relative_eq!(back.height, original.height, epsilon = 1e-5);
    }

    #[test]
    fn earth_centre_has_no_cartographic() {
        assert!(Cartographic::from_cartesian(Vec3::ZERO).is_none());
        assert!(Cartographic::from_cartesian(Vec3::new(f64::NAN, 0.0, 0.0)).is_none());
    }

    #[test]
    fn great_circle_along_equator() {
        let (mid, dist) = great_circle_midpoint(
            Cartographic::new(0.0, 0.0, 0.0),
            Cartographic::new(10.0, 0.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(mid.longitude, 5.0, epsilon = 1e-9);
        assert_relative_eq!(mid.latitude, 0.0, epsilon = 1e-9);
        assert_relative_eq!(dist, 10f64.to_radians() * MEAN_RADIUS, epsilon = 1e-6);
    }

    #[test]
    fn great_circle_rejects_antipodes() {
        let result = great_circle_midpoint(
            Cartographic::new(0.0, 0.0, 0.0),
            Cartographic::new(180.0, 0.0, 0.0),
        );
        assert!(result.is_none());
    }
}
