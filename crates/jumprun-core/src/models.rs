//! Core data models for wind profiles, jump-run solutions and traffic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Wind observed at a single altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub altitude_ft: f64,
    /// Direction the wind is blowing FROM, degrees in [0, 360)
    pub direction_from_deg: f64,
    pub speed_kt: f64,
}

impl WindSample {
    pub fn new(altitude_ft: f64, direction_from_deg: f64, speed_kt: f64) -> Self {
        Self {
            altitude_ft,
            direction_from_deg: normalize_deg(direction_from_deg),
            speed_kt: speed_kt.max(0.0),
        }
    }

    /// Bearing the air mass is moving toward.
    pub fn toward_deg(&self) -> f64 {
        normalize_deg(self.direction_from_deg + 180.0)
    }
}

/// Wind sample taken from a sparse source (a forecast pressure level).
///
/// Either field may be missing when the source had no value for the level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawWindLevel {
    pub altitude_ft: f64,
    pub direction_from_deg: Option<f64>,
    pub speed_kt: Option<f64>,
}

/// Dense wind profile at fixed target altitudes.
///
/// Altitudes are strictly ascending and unique. A profile is only built by
/// the resampler and replaced as a whole, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedProfile")]
pub struct WindProfile {
    samples: Vec<WindSample>,
}

/// Wire form of a profile before the altitude ordering is checked.
#[derive(Deserialize)]
struct UncheckedProfile {
    samples: Vec<WindSample>,
}

impl TryFrom<UncheckedProfile> for WindProfile {
    type Error = CoreError;

    fn try_from(raw: UncheckedProfile) -> Result<Self, Self::Error> {
        if raw.samples.iter().any(|s| {
            !(s.altitude_ft.is_finite() && s.direction_from_deg.is_finite() && s.speed_kt.is_finite())
        }) {
            return Err(CoreError::InvalidProfile("non-finite sample"));
        }
        if !raw
            .samples
            .windows(2)
            .all(|pair| pair[0].altitude_ft < pair[1].altitude_ft)
        {
            return Err(CoreError::InvalidProfile(
                "altitudes must be strictly ascending",
            ));
        }
        Ok(Self {
            samples: raw.samples,
        })
    }
}

impl WindProfile {
    /// Build a profile from samples already sorted by strictly ascending altitude.
    pub(crate) fn from_sorted(samples: Vec<WindSample>) -> Self {
        debug_assert!(samples
            .windows(2)
            .all(|pair| pair[0].altitude_ft < pair[1].altitude_ft));
        Self { samples }
    }

    pub fn samples(&self) -> &[WindSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample whose altitude is closest to `altitude_ft`. Ties go to the lower altitude.
    pub fn nearest(&self, altitude_ft: f64) -> Option<&WindSample> {
        let mut best: Option<&WindSample> = None;
        for sample in &self.samples {
            let diff = (sample.altitude_ft - altitude_ft).abs();
            match best {
                Some(current) if (current.altitude_ft - altitude_ft).abs() <= diff => {}
                _ => best = Some(sample),
            }
        }
        best
    }

    /// Samples with altitude inside `[min_ft, max_ft]`.
    pub fn band(&self, min_ft: f64, max_ft: f64) -> impl Iterator<Item = &WindSample> {
        self.samples
            .iter()
            .filter(move |s| s.altitude_ft >= min_ft && s.altitude_ft <= max_ft)
    }
}

/// Net horizontal displacement in statute miles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftVector {
    pub east_miles: f64,
    pub north_miles: f64,
}

impl DriftVector {
    pub fn magnitude(&self) -> f64 {
        self.east_miles.hypot(self.north_miles)
    }

    /// Signed length along the axis of `heading_deg` (0 = north, clockwise).
    pub fn project_onto(&self, heading_deg: f64) -> f64 {
        let heading_rad = heading_deg.to_radians();
        self.east_miles * heading_rad.sin() + self.north_miles * heading_rad.cos()
    }

    pub fn is_finite(&self) -> bool {
        self.east_miles.is_finite() && self.north_miles.is_finite()
    }
}

impl std::ops::Add for DriftVector {
    type Output = DriftVector;

    fn add(self, rhs: DriftVector) -> DriftVector {
        DriftVector {
            east_miles: self.east_miles + rhs.east_miles,
            north_miles: self.north_miles + rhs.north_miles,
        }
    }
}

/// Geographic point (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Result of a full jump-run computation. Replaced wholesale on recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpRunSolution {
    pub heading_deg: f64,
    /// Release ("green light") offset along the heading axis, clamped
    pub offset_miles: f64,
    pub opening_offset_miles: f64,
    pub exit_offset_miles: f64,
    pub ground_speed_kt: f64,
    pub exit_separation_sec: u32,
    pub exit_wind: WindSample,
    pub green_light: GeoPoint,
    pub computed_at: DateTime<Utc>,
}

/// 24-bit ICAO aircraft address ("hex").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IcaoAddress(u32);

impl IcaoAddress {
    pub const MAX: u32 = 0x00FF_FFFF;

    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl FromStr for IcaoAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Non-ICAO (TIS-B/anonymous) addresses are prefixed with '~' by readsb
        let trimmed = s.trim().trim_start_matches('~');
        if trimmed.is_empty() || trimmed.len() > 6 {
            return Err(format!("invalid hex address '{}'", s));
        }
        u32::from_str_radix(trimmed, 16)
            .ok()
            .and_then(IcaoAddress::new)
            .ok_or_else(|| format!("invalid hex address '{}'", s))
    }
}

impl TryFrom<String> for IcaoAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IcaoAddress> for String {
    fn from(value: IcaoAddress) -> Self {
        value.to_string()
    }
}

impl fmt::Display for IcaoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

/// One aircraft from a traffic batch, already normalized at the feed boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftRecord {
    pub id: IcaoAddress,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    #[serde(default)]
    pub ground_speed_kt: Option<f64>,
    #[serde(default)]
    pub track_deg: Option<f64>,
    #[serde(default)]
    pub tail_number: Option<String>,
    #[serde(default)]
    pub callsign: Option<String>,
}

impl AircraftRecord {
    pub fn position(&self) -> TrackPoint {
        TrackPoint {
            lat: self.lat,
            lon: self.lon,
            altitude_ft: self.altitude_ft,
        }
    }
}

/// Point of a trailing track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
}

/// Normalize an angle in degrees to [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let value = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if value >= 360.0 {
        0.0
    } else {
        value
    }
}
