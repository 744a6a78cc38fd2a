//! ADS-B traffic relay client.
//!
//! The relay returns readsb/adsb.lol style JSON. Every entry is normalized here,
//! once, into an `AircraftRecord`; entries that cannot be normalized are dropped.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use jumprun_core::{AircraftRecord, IcaoAddress};

/// HTTP client for the traffic relay.
pub struct TrafficClient {
    client: Client,
    url: String,
}

impl TrafficClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().context("Failed to create HTTP client")?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Poll the relay once.
    pub async fn fetch_batch(&self) -> Result<Vec<AircraftRecord>> {
        let payload: Value = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Traffic request failed")?
            .error_for_status()
            .context("Traffic relay returned an error status")?
            .json()
            .await
            .context("Failed to decode traffic payload")?;

        let records = normalize_batch(&payload);
        tracing::debug!("Traffic relay returned {} usable aircraft", records.len());
        Ok(records)
    }
}

/// Normalize a relay payload (`{"ac": [...]}` or `{"aircraft": [...]}`).
///
/// Missing-field policy:
/// - `hex`, `lat`, `lon` are required; `lat`/`lon` must be JSON numbers
/// - altitude prefers `alt_geom`, then numeric `alt_baro`; `"ground"` means 0 ft; none drops the entry
/// - speed, track, registration and callsign are optional
pub fn normalize_batch(payload: &Value) -> Vec<AircraftRecord> {
    let entries = payload
        .get("ac")
        .or_else(|| payload.get("aircraft"))
        .and_then(|v| v.as_array());

    let Some(entries) = entries else {
        return Vec::new();
    };

    entries.iter().filter_map(normalize_aircraft).collect()
}

fn normalize_aircraft(entry: &Value) -> Option<AircraftRecord> {
    let id: IcaoAddress = entry.get("hex")?.as_str()?.parse().ok()?;
    let lat = entry.get("lat")?.as_f64()?;
    let lon = entry.get("lon")?.as_f64()?;

    let altitude_ft = first_number(&[entry.get("alt_geom"), entry.get("alt_baro")]).or_else(|| {
        entry
            .get("alt_baro")
            .and_then(|v| v.as_str())
            .filter(|s| s.eq_ignore_ascii_case("ground"))
            .map(|_| 0.0)
    })?;

    Some(AircraftRecord {
        id,
        lat,
        lon,
        altitude_ft,
        ground_speed_kt: first_number(&[entry.get("gs")]),
        track_deg: first_number(&[entry.get("track"), entry.get("true_heading")]),
        tail_number: first_string(&[entry.get("r"), entry.get("registration")]),
        callsign: first_string(&[entry.get("flight")]),
    })
}

fn first_number(candidates: &[Option<&Value>]) -> Option<f64> {
    candidates
        .iter()
        .find_map(|value| value.and_then(|v| v.as_f64()))
}

fn first_string(candidates: &[Option<&Value>]) -> Option<String> {
    candidates.iter().find_map(|value| {
        value
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
