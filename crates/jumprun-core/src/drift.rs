//! Layered wind-drift integration over a descent.
//!
//! The descent between two altitudes is split at every profile altitude that lies
//! strictly inside the range. Each layer drifts with the wind sampled nearest to its
//! midpoint for as long as the body takes to fall through it.

use crate::models::{DriftVector, WindProfile, WindSample};

pub const FEET_PER_MILE: f64 = 5280.0;
pub const MPH_PER_KNOT: f64 = 1.150_779;

/// Net displacement while descending from `start_ft` to `end_ft` at `descent_rate_mph`.
///
/// Returns a zero vector when `start_ft <= end_ft` or the profile is empty. A zero or
/// negative descent rate yields a non-finite vector which callers must reject.
pub fn integrate_drift(
    profile: &WindProfile,
    start_ft: f64,
    end_ft: f64,
    descent_rate_mph: f64,
) -> DriftVector {
    if !(start_ft > end_ft) || profile.is_empty() {
        return DriftVector::default();
    }

    let breakpoints = layer_breakpoints(profile, start_ft, end_ft);
    if breakpoints.len() == 2 {
        // No profile altitude inside the range: one layer, midpoint sample
        return layer_drift(profile, start_ft, end_ft, descent_rate_mph);
    }

    breakpoints
        .windows(2)
        .map(|pair| layer_drift(profile, pair[0], pair[1], descent_rate_mph))
        .fold(DriftVector::default(), |acc, layer| acc + layer)
}

/// Start, end, and every profile altitude strictly between them, descending.
fn layer_breakpoints(profile: &WindProfile, start_ft: f64, end_ft: f64) -> Vec<f64> {
    let mut points = Vec::with_capacity(profile.len() + 2);
    points.push(start_ft);
    points.extend(
        profile
            .samples()
            .iter()
            .map(|s| s.altitude_ft)
            .filter(|alt| *alt < start_ft && *alt > end_ft),
    );
    points.push(end_ft);
    points.sort_by(|a, b| b.total_cmp(a));
    points.dedup();
    points
}

fn layer_drift(
    profile: &WindProfile,
    top_ft: f64,
    bottom_ft: f64,
    descent_rate_mph: f64,
) -> DriftVector {
    let midpoint = (top_ft + bottom_ft) / 2.0;
    let Some(sample) = profile.nearest(midpoint) else {
        return DriftVector::default();
    };
    let dwell_hours = (top_ft - bottom_ft) / FEET_PER_MILE / descent_rate_mph;
    drift_for(sample, dwell_hours)
}

/// Displacement of a body carried by `sample` for `hours`.
pub fn drift_for(sample: &WindSample, hours: f64) -> DriftVector {
    let distance = sample.speed_kt * MPH_PER_KNOT * hours;
    let bearing_rad = sample.toward_deg().to_radians();
    DriftVector {
        east_miles: distance * bearing_rad.sin(),
        north_miles: distance * bearing_rad.cos(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawWindLevel;
    use crate::profile::resample;

    fn uniform_profile(dir: f64, speed: f64) -> WindProfile {
        let raw = vec![RawWindLevel {
            altitude_ft: 5000.0,
            direction_from_deg: Some(dir),
            speed_kt: Some(speed),
        }];
        let targets: Vec<f64> = (0..=14).map(|i| i as f64 * 1000.0).collect();
        resample(&raw, &targets).unwrap()
    }

    #[test]
    fn uniform_field_matches_closed_form() {
        let profile = uniform_profile(300.0, 17.0);
        let drift = integrate_drift(&profile, 13_500.0, 3_000.0, 120.0);

        let hours = (13_500.0 - 3_000.0) / FEET_PER_MILE / 120.0;
        let distance = 17.0 * MPH_PER_KNOT * hours;
        let bearing = 120.0_f64.to_radians();
        assert!((drift.east_miles - distance * bearing.sin()).abs() < 1e-9);
        assert!((drift.north_miles - distance * bearing.cos()).abs() < 1e-9);
        assert!((drift.magnitude() - distance).abs() < 1e-9);
    }

    #[test]
    fn wind_from_west_drifts_east() {
        let profile = uniform_profile(270.0, 10.0);
        let drift = integrate_drift(&profile, 3_000.0, 0.0, 15.0);
        assert!(drift.east_miles > 0.0);
        assert!(drift.north_miles.abs() < 1e-9);
    }

    #[test]
    fn layers_use_their_own_wind() {
        // Calm below 2000 ft, 20 kt from the north above
        let raw = vec![
            RawWindLevel {
                altitude_ft: 0.0,
                direction_from_deg: Some(0.0),
                speed_kt: Some(0.0),
            },
            RawWindLevel {
                altitude_ft: 4000.0,
                direction_from_deg: Some(0.0),
                speed_kt: Some(20.0),
            },
        ];
        let targets = [0.0, 1000.0, 2000.0, 3000.0, 4000.0];
        let profile = resample(&raw, &targets).unwrap();
        // 1000 -> calm (nearest 0), 2000 -> tie -> first input (calm), 3000/4000 -> 20 kt
        let drift = integrate_drift(&profile, 4000.0, 0.0, 60.0);

        // Only the 4000-3000 layer (midpoint 3500 -> 3000 ft sample) carries wind
        let layer_hours = 1000.0 / FEET_PER_MILE / 60.0;
        let expected_south = 20.0 * MPH_PER_KNOT * layer_hours;
        assert!((drift.north_miles + expected_south).abs() < 1e-9);
        assert!(drift.east_miles.abs() < 1e-9);
    }

    #[test]
    fn range_without_profile_altitudes_uses_midpoint_sample() {
        let raw = vec![
            RawWindLevel {
                altitude_ft: 0.0,
                direction_from_deg: Some(90.0),
                speed_kt: Some(5.0),
            },
            RawWindLevel {
                altitude_ft: 10_000.0,
                direction_from_deg: Some(180.0),
                speed_kt: Some(30.0),
            },
        ];
        let profile = resample(&raw, &[0.0, 10_000.0]).unwrap();
        let drift = integrate_drift(&profile, 9_000.0, 7_000.0, 100.0);
        // midpoint 8000 -> 10k sample, blowing north
        assert!(drift.north_miles > 0.0);
        assert!(drift.east_miles.abs() < 1e-9);
    }

    #[test]
    fn inverted_range_is_zero() {
        let profile = uniform_profile(270.0, 10.0);
        assert_eq!(integrate_drift(&profile, 0.0, 3000.0, 15.0), DriftVector::default());
        assert_eq!(integrate_drift(&profile, 3000.0, 3000.0, 15.0), DriftVector::default());
    }

    #[test]
    fn zero_rate_is_not_finite() {
        let profile = uniform_profile(270.0, 10.0);
        assert!(!integrate_drift(&profile, 3000.0, 0.0, 0.0).is_finite());
    }
}
