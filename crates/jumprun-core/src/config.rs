//! Physical and geometric constants for the spot computation.

use serde::{Deserialize, Serialize};

/// Skydiver, canopy, aircraft and jump-run constants.
///
/// Speeds for falling bodies and canopies are in mph, distances in statute miles,
/// aircraft speeds in knots, altitudes in feet AGL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotConfig {
    pub exit_altitude_ft: f64,
    pub opening_altitude_ft: f64,
    /// Freefall vertical speed (mph)
    pub freefall_rate_mph: f64,
    /// Canopy vertical speed (mph)
    pub canopy_descent_mph: f64,
    /// Canopy horizontal airspeed (mph)
    pub canopy_forward_mph: f64,
    /// Distance from the aircraft's nose position to the door (miles)
    pub door_distance_miles: f64,
    /// Residual drift allowance subtracted after the freefall phase (miles)
    pub drift_fudge_miles: f64,
    /// Release offset is clamped to +/- this value (miles)
    pub max_offset_miles: f64,
    /// Altitude band used for the jump-run heading
    pub heading_band_min_ft: f64,
    pub heading_band_max_ft: f64,
    /// Jump-run indicated airspeed (knots)
    pub airspeed_kt: f64,
    /// Ground speed (kt) -> exit separation (s), ascending by ground speed
    pub separation_table: Vec<(f64, f64)>,
    /// Altitudes of the resampled profile, strictly ascending
    pub target_altitudes_ft: Vec<f64>,
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self {
            exit_altitude_ft: 13_500.0,
            opening_altitude_ft: 3_000.0,
            freefall_rate_mph: 120.0,
            canopy_descent_mph: 15.0,
            canopy_forward_mph: 20.0,
            door_distance_miles: 0.05,
            drift_fudge_miles: 0.0,
            max_offset_miles: 1.5,
            heading_band_min_ft: 5_000.0,
            heading_band_max_ft: 14_000.0,
            airspeed_kt: 80.0,
            separation_table: vec![
                (20.0, 30.0),
                (40.0, 15.0),
                (60.0, 11.0),
                (80.0, 8.0),
                (100.0, 6.0),
            ],
            target_altitudes_ft: (0..=14).map(|i| i as f64 * 1000.0).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_cover_ground_to_14k() {
        let config = SpotConfig::default();
        assert_eq!(config.target_altitudes_ft.len(), 15);
        assert_eq!(config.target_altitudes_ft[0], 0.0);
        assert_eq!(config.target_altitudes_ft[14], 14_000.0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SpotConfig =
            serde_json::from_str(r#"{"exit_altitude_ft": 10000.0}"#).unwrap();
        assert_eq!(config.exit_altitude_ft, 10_000.0);
        assert_eq!(config.opening_altitude_ft, 3_000.0);
    }
}
