//! Open-Meteo pressure-level wind forecast client.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use jumprun_core::RawWindLevel;

/// Forecast pressure levels (hPa) and their nominal standard-atmosphere altitude (ft).
pub const PRESSURE_LEVELS: [(u32, f64); 5] = [
    (1000, 360.0),
    (925, 2_500.0),
    (850, 4_780.0),
    (700, 9_880.0),
    (600, 13_800.0),
];

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// HTTP client for the wind forecast API.
pub struct WindClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub utc_offset_seconds: i64,
    pub hourly: HourlySeries,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(flatten)]
    pub values: HashMap<String, Vec<Option<f64>>>,
}

impl WindClient {
    /// Create a new forecast client. Without a timeout the platform default applies.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().context("Failed to create HTTP client")?,
            base_url: base_url.into(),
        })
    }

    /// Fetch the raw pressure-level winds for the hour nearest to now.
    pub async fn fetch_levels(&self, lat: f64, lon: f64) -> Result<Vec<RawWindLevel>> {
        let hourly = hourly_variables();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("hourly", hourly),
                ("wind_speed_unit", "kn".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await
            .context("Wind forecast request failed")?
            .error_for_status()
            .context("Wind forecast returned an error status")?;

        let forecast: ForecastResponse = response
            .json()
            .await
            .context("Failed to decode wind forecast")?;

        parse_forecast(&forecast, Utc::now())
    }
}

fn hourly_variables() -> String {
    PRESSURE_LEVELS
        .iter()
        .flat_map(|(hpa, _)| {
            [
                format!("wind_speed_{}hPa", hpa),
                format!("wind_direction_{}hPa", hpa),
            ]
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Read every pressure level at the forecast hour closest to `now`.
///
/// Levels without a value at that hour come back with `None` fields; the
/// resampler skips them.
pub fn parse_forecast(
    forecast: &ForecastResponse,
    now: DateTime<Utc>,
) -> Result<Vec<RawWindLevel>> {
    let index = nearest_time_index(&forecast.hourly.time, forecast.utc_offset_seconds, now)
        .ok_or_else(|| anyhow!("Wind forecast has no usable timestamps"))?;

    let value_at = |name: String| -> Option<f64> {
        forecast
            .hourly
            .values
            .get(&name)
            .and_then(|series| series.get(index).copied().flatten())
    };

    Ok(PRESSURE_LEVELS
        .iter()
        .map(|(hpa, altitude_ft)| RawWindLevel {
            altitude_ft: *altitude_ft,
            direction_from_deg: value_at(format!("wind_direction_{}hPa", hpa)),
            speed_kt: value_at(format!("wind_speed_{}hPa", hpa)),
        })
        .collect())
}

fn nearest_time_index(
    times: &[String],
    utc_offset_seconds: i64,
    now: DateTime<Utc>,
) -> Option<usize> {
    times
        .iter()
        .enumerate()
        .filter_map(|(index, text)| {
            let local = NaiveDateTime::parse_from_str(text, TIME_FORMAT).ok()?;
            let utc =
                Utc.from_utc_datetime(&(local - ChronoDuration::seconds(utc_offset_seconds)));
            Some((index, (utc - now).num_seconds().abs()))
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(index, _)| index)
}
