//! Geodesy primitives.
//!
//! Local-area math on WGS84 lat/lon degrees: planar meter offsets,
//! distances and bearings. Uses an equirectangular approximation that is
//! accurate for the short ranges an ROV operates over; nothing here is
//! suitable for continental distances.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Meters per degree of latitude at the equator.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Planar offset in meters from `reference` to `point`, in screen
/// convention: +x east, +y south (latitude grows north, screen y grows
/// down, hence the sign flip).
pub fn local_offset_m(point: GeoPoint, reference: GeoPoint) -> Vector2<f64> {
    let lat_m = (point.lat - reference.lat) * METERS_PER_DEGREE;
    let lon_m = (point.lon - reference.lon) * METERS_PER_DEGREE * reference.lat.to_radians().cos();
    Vector2::new(lon_m, -lat_m)
}

/// Distance in meters, with the longitude scale taken at the midpoint
/// latitude for slightly better accuracy than referencing one endpoint.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_m = (a.lat - b.lat) * METERS_PER_DEGREE;
    let mid_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let lon_m = (a.lon - b.lon) * METERS_PER_DEGREE * mid_lat.cos();
    (lat_m * lat_m + lon_m * lon_m).sqrt()
}

/// Initial bearing from `from` to `to`, degrees clockwise from true north
/// in [0, 360).
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lon = (to.lon - from.lon).to_radians();
    let from_lat = from.lat.to_radians();
    let to_lat = to.lat.to_radians();
    let y = d_lon.sin() * to_lat.cos();
    let x = from_lat.cos() * to_lat.sin() - from_lat.sin() * to_lat.cos() * d_lon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = pt(63.4305, 10.3951);
        assert_eq!(distance_m(p, p), 0.0);
    }

    #[test]
    fn distance_one_degree_latitude() {
        let a = pt(10.0, 20.0);
        let b = pt(11.0, 20.0);
        let d = distance_m(a, b);
        assert!((d - METERS_PER_DEGREE).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn distance_longitude_shrinks_with_latitude() {
        let equator = distance_m(pt(0.0, 0.0), pt(0.0, 1.0));
        let north = distance_m(pt(60.0, 0.0), pt(60.0, 1.0));
        // cos(60°) = 0.5
        assert!((north / equator - 0.5).abs() < 0.01, "ratio {}", north / equator);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = pt(63.43, 10.39);
        let b = pt(63.44, 10.41);
        assert!((distance_m(a, b) - distance_m(b, a)).abs() < 1e-9);
    }

    #[test]
    fn offset_north_is_negative_y() {
        // ~100 m north of the reference
        let reference = pt(10.0, 20.0);
        let point = pt(10.0009, 20.0);
        let v = local_offset_m(point, reference);
        assert!(v.x.abs() < 1e-9);
        assert!((v.y - (-100.188)).abs() < 0.01, "got {}", v.y);
    }

    #[test]
    fn offset_east_is_positive_x() {
        let reference = pt(0.0, 20.0);
        let point = pt(0.0, 20.001);
        let v = local_offset_m(point, reference);
        assert!(v.x > 0.0);
        assert!(v.y.abs() < 1e-9);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = pt(10.0, 20.0);
        assert!((bearing_deg(origin, pt(10.01, 20.0)) - 0.0).abs() < 0.1);
        assert!((bearing_deg(origin, pt(10.0, 20.01)) - 90.0).abs() < 0.1);
        assert!((bearing_deg(origin, pt(9.99, 20.0)) - 180.0).abs() < 0.1);
        assert!((bearing_deg(origin, pt(10.0, 19.99)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn bearing_stays_in_range() {
        let origin = pt(45.0, 7.0);
        for (lat, lon) in [(45.1, 7.1), (44.9, 7.1), (44.9, 6.9), (45.1, 6.9)] {
            let b = bearing_deg(origin, pt(lat, lon));
            assert!((0.0..360.0).contains(&b), "bearing {b} out of range");
        }
    }
}
