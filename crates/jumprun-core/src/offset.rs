//! Release-point offset along the jump-run axis.
//!
//! The offset is built in three dependent phases: canopy (opening point), freefall
//! (exit point) and rigging (green light). Offsets are signed statute miles along the
//! heading axis measured from the DZ; negative values lie before the DZ.

use serde::{Deserialize, Serialize};

use crate::config::SpotConfig;
use crate::drift::{integrate_drift, FEET_PER_MILE};
use crate::models::{DriftVector, WindProfile};

/// Intermediate and final values of one offset solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetBreakdown {
    pub canopy_drift: DriftVector,
    pub freefall_drift: DriftVector,
    pub flyable_miles: f64,
    pub opening_offset_miles: f64,
    pub exit_offset_miles: f64,
    /// Green-light offset, clamped to the configured maximum
    pub release_offset_miles: f64,
}

/// Run the canopy, freefall and rigging phases for `heading_deg`.
///
/// If any intermediate value is not finite, every offset is reset to zero.
pub fn solve_offset(
    profile: &WindProfile,
    heading_deg: f64,
    config: &SpotConfig,
) -> OffsetBreakdown {
    // Canopy: opening altitude to ground
    let canopy_drift = integrate_drift(
        profile,
        config.opening_altitude_ft,
        0.0,
        config.canopy_descent_mph,
    );
    let canopy_hours = config.opening_altitude_ft / FEET_PER_MILE / config.canopy_descent_mph;
    let flyable_miles = config.canopy_forward_mph * canopy_hours;
    let canopy_along = canopy_drift.project_onto(heading_deg);
    let opening_offset_miles = -(flyable_miles + canopy_along);

    // Freefall: exit altitude to opening altitude
    let freefall_drift = integrate_drift(
        profile,
        config.exit_altitude_ft,
        config.opening_altitude_ft,
        config.freefall_rate_mph,
    );
    let freefall_along = freefall_drift.project_onto(heading_deg);
    let exit_offset_miles = opening_offset_miles - freefall_along;

    // Rigging
    let release = exit_offset_miles - config.door_distance_miles - config.drift_fudge_miles;

    let all_finite = canopy_drift.is_finite()
        && freefall_drift.is_finite()
        && [flyable_miles, opening_offset_miles, exit_offset_miles, release]
            .iter()
            .all(|v| v.is_finite());

    if !all_finite {
        return OffsetBreakdown {
            canopy_drift,
            freefall_drift,
            flyable_miles,
            ..OffsetBreakdown::default()
        };
    }

    OffsetBreakdown {
        canopy_drift,
        freefall_drift,
        flyable_miles,
        opening_offset_miles,
        exit_offset_miles,
        release_offset_miles: clamp_offset(release, config.max_offset_miles),
    }
}

fn clamp_offset(offset: f64, max_offset: f64) -> f64 {
    let max = max_offset.abs();
    if !max.is_finite() {
        return offset;
    }
    offset.clamp(-max, max)
}
