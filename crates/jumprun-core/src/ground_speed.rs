//! Jump-run ground speed and exit separation timing.

use crate::models::WindSample;

/// Aircraft ground speed along `heading_deg` with `airspeed_kt` through `exit_wind`.
///
/// The wind component along the heading is positive for a tailwind. The result is
/// floored at zero.
pub fn ground_speed(heading_deg: f64, airspeed_kt: f64, exit_wind: &WindSample) -> f64 {
    let toward_rad = exit_wind.toward_deg().to_radians();
    let wind_x = toward_rad.sin() * exit_wind.speed_kt;
    let wind_y = toward_rad.cos() * exit_wind.speed_kt;

    let heading_rad = heading_deg.to_radians();
    let along = wind_x * heading_rad.sin() + wind_y * heading_rad.cos();

    (airspeed_kt + along).max(0.0)
}

/// Seconds between exiting groups for `ground_speed_kt`.
///
/// `table` holds `(ground speed kt, separation s)` breakpoints sorted by ground speed.
/// Values outside the table saturate at the first or last entry; values in between
/// are linearly interpolated and rounded to whole seconds.
pub fn exit_separation(ground_speed_kt: f64, table: &[(f64, f64)]) -> u32 {
    let (Some(first), Some(last)) = (table.first(), table.last()) else {
        return 0;
    };

    let seconds = if ground_speed_kt <= first.0 {
        first.1
    } else if ground_speed_kt >= last.0 {
        last.1
    } else {
        table
            .windows(2)
            .find(|pair| ground_speed_kt >= pair[0].0 && ground_speed_kt <= pair[1].0)
            .map(|pair| {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                if x1 == x0 {
                    y0
                } else {
                    y0 + (ground_speed_kt - x0) * (y1 - y0) / (x1 - x0)
                }
            })
            .unwrap_or(last.1)
    };

    seconds.round().max(0.0) as u32
}
