//! Jump-run heading from a band of the wind profile.

use crate::error::{CoreError, Result};
use crate::models::{normalize_deg, WindProfile};

/// Speed-weighted vector mean of the wind-FROM directions inside `[min_ft, max_ft]`.
///
/// The result is not reversed: flying this heading puts the aircraft into the
/// mean wind. Returns `NoWindData` when the band holds no samples.
pub fn estimate_heading(profile: &WindProfile, min_ft: f64, max_ft: f64) -> Result<f64> {
    let mut count = 0usize;
    let (sum_x, sum_y) = profile
        .band(min_ft, max_ft)
        .fold((0.0, 0.0), |(x, y), sample| {
            count += 1;
            let rad = sample.direction_from_deg.to_radians();
            (x + rad.sin() * sample.speed_kt, y + rad.cos() * sample.speed_kt)
        });

    if count == 0 {
        return Err(CoreError::NoWindData("heading band is empty"));
    }

    Ok(normalize_deg(sum_x.atan2(sum_y).to_degrees()))
}
