//! Resampling of sparse wind levels into a dense fixed-altitude profile.

use crate::error::{CoreError, Result};
use crate::models::{RawWindLevel, WindProfile, WindSample};

/// Build a profile at `target_altitudes_ft` from sparse raw levels.
///
/// Each target takes its direction and speed from the resolved raw level with the
/// smallest absolute altitude difference; equal differences go to the level that
/// appears first in `raw`. Levels missing a direction or speed are skipped.
pub fn resample(raw: &[RawWindLevel], target_altitudes_ft: &[f64]) -> Result<WindProfile> {
    let resolved: Vec<WindSample> = raw.iter().filter_map(resolve_level).collect();
    if resolved.is_empty() {
        return Err(CoreError::NoWindData("no raw wind level resolved"));
    }

    let mut targets: Vec<f64> = target_altitudes_ft
        .iter()
        .copied()
        .filter(|alt| alt.is_finite())
        .collect();
    targets.sort_by(f64::total_cmp);
    targets.dedup();
    if targets.is_empty() {
        return Err(CoreError::NoWindData("no target altitudes"));
    }

    let samples = targets
        .into_iter()
        .map(|target| {
            let source = nearest_in_order(&resolved, target);
            WindSample {
                altitude_ft: target,
                direction_from_deg: source.direction_from_deg,
                speed_kt: source.speed_kt,
            }
        })
        .collect();

    Ok(WindProfile::from_sorted(samples))
}

fn resolve_level(level: &RawWindLevel) -> Option<WindSample> {
    let direction = level.direction_from_deg.filter(|d| d.is_finite())?;
    let speed = level.speed_kt.filter(|s| s.is_finite())?;
    if !level.altitude_ft.is_finite() {
        return None;
    }
    Some(WindSample::new(level.altitude_ft, direction, speed))
}

fn nearest_in_order(resolved: &[WindSample], target: f64) -> &WindSample {
    let mut best = &resolved[0];
    let mut best_diff = (best.altitude_ft - target).abs();
    for sample in &resolved[1..] {
        let diff = (sample.altitude_ft - target).abs();
        if diff < best_diff {
            best = sample;
            best_diff = diff;
        }
    }
    best
}
