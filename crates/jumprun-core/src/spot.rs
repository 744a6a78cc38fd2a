//! Full jump-run solution from a wind profile.

use chrono::Utc;

use crate::config::SpotConfig;
use crate::error::{CoreError, Result};
use crate::geo::project_point;
use crate::ground_speed::{exit_separation, ground_speed};
use crate::heading::estimate_heading;
use crate::models::{GeoPoint, JumpRunSolution, WindProfile};
use crate::offset::solve_offset;

/// Heading, release offset and exit timing for `profile` over the DZ at `dz`.
///
/// Fails with `NoWindData` when the heading band is empty; callers then fall back
/// to `solve_jump_run_with_heading` with their previous heading.
pub fn solve_jump_run(
    profile: &WindProfile,
    config: &SpotConfig,
    dz: GeoPoint,
) -> Result<JumpRunSolution> {
    let heading_deg = estimate_heading(
        profile,
        config.heading_band_min_ft,
        config.heading_band_max_ft,
    )?;
    solve_jump_run_with_heading(profile, config, dz, heading_deg)
}

/// Offset and exit timing for `profile` along a heading chosen by the caller.
///
/// Used to carry a previous heading over a profile whose heading band is empty.
pub fn solve_jump_run_with_heading(
    profile: &WindProfile,
    config: &SpotConfig,
    dz: GeoPoint,
    heading_deg: f64,
) -> Result<JumpRunSolution> {
    let offset = solve_offset(profile, heading_deg, config);

    let exit_wind = *profile
        .nearest(config.exit_altitude_ft)
        .ok_or(CoreError::NoWindData("no wind at exit altitude"))?;
    let ground_speed_kt = ground_speed(heading_deg, config.airspeed_kt, &exit_wind);
    let exit_separation_sec = exit_separation(ground_speed_kt, &config.separation_table);

    Ok(JumpRunSolution {
        heading_deg,
        offset_miles: offset.release_offset_miles,
        opening_offset_miles: offset.opening_offset_miles,
        exit_offset_miles: offset.exit_offset_miles,
        ground_speed_kt,
        exit_separation_sec,
        exit_wind,
        green_light: project_point(dz, heading_deg, offset.release_offset_miles),
        computed_at: Utc::now(),
    })
}
