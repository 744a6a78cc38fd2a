//! Point projection along a bearing on a spherical earth.

use crate::models::GeoPoint;

const EARTH_RADIUS_MILES: f64 = 3_958.8;

/// Destination reached by travelling `distance_miles` from `origin` on `bearing_deg`.
///
/// A negative distance travels along the reciprocal bearing.
pub fn project_point(origin: GeoPoint, bearing_deg: f64, distance_miles: f64) -> GeoPoint {
    if distance_miles.abs() <= f64::EPSILON || !distance_miles.is_finite() {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let bearing_rad = bearing_deg.to_radians();
    let angular_distance = distance_miles / EARTH_RADIUS_MILES;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    GeoPoint {
        lat: lat2.to_degrees(),
        lon: lon2.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DZ: GeoPoint = GeoPoint {
        lat: 42.703153,
        lon: -87.958641,
    };

    #[test]
    fn zero_distance_is_origin() {
        assert_eq!(project_point(DZ, 45.0, 0.0), DZ);
    }

    #[test]
    fn north_one_mile_moves_latitude_only() {
        let p = project_point(DZ, 0.0, 1.0);
        let expected_dlat = (1.0 / EARTH_RADIUS_MILES).to_degrees();
        assert!((p.lat - DZ.lat - expected_dlat).abs() < 1e-9);
        assert!((p.lon - DZ.lon).abs() < 1e-9);
    }

    #[test]
    fn negative_distance_goes_the_other_way() {
        let ahead = project_point(DZ, 270.0, 0.5);
        let behind = project_point(DZ, 270.0, -0.5);
        assert!(ahead.lon < DZ.lon);
        assert!(behind.lon > DZ.lon);
        let back = project_point(DZ, 90.0, 0.5);
        assert!((behind.lon - back.lon).abs() < 1e-9);
    }
}
