//! End-to-end behavior through the public library surface, no network.

use chrono::Utc;
use serde_json::json;
use std::cell::Cell;
use std::time::Duration;

use jumprun_core::{resample, CorrelatorConfig, GeoPoint, RawWindLevel, SpotConfig};
use jumprun_feeds::normalize_batch;
use jumprun_server::backoff::RetryPolicy;
use jumprun_server::cache::{CacheEntry, FileCache, ProfileCache};
use jumprun_server::config::parse_hex_list;
use jumprun_server::loops::wind_loop::refresh_wind;
use jumprun_server::resilience::ResilienceLayer;
use jumprun_server::state::{AppState, NoticeSeverity, WindSource};

fn dz() -> GeoPoint {
    GeoPoint {
        lat: 42.703153,
        lon: -87.958641,
    }
}

#[test]
fn highest_jump_aircraft_is_highlighted_from_relay_payload() {
    let jump = parse_hex_list("a1b2c3, A4B5C6");
    let state = AppState::new(SpotConfig::default(), dz(), CorrelatorConfig::new(jump));

    let payload = json!({
        "ac": [
            { "hex": "a1b2c3", "lat": 42.70, "lon": -87.95, "alt_baro": 9000, "gs": 88.0, "track": 265.0 },
            { "hex": "~a4b5c6", "lat": 42.72, "lon": -87.97, "alt_geom": 11000, "gs": 92.0, "track": 270.0 },
            { "hex": "c0ffee", "lat": 42.60, "lon": -87.90, "alt_baro": 3500, "flight": "N55GA   " }
        ]
    });
    let summary = state.apply_traffic(normalize_batch(&payload));
    assert_eq!(summary.accepted, 3);
    assert_eq!(summary.candidates, 2);

    let highlight = state.highlight();
    let highlighted = highlight.aircraft.expect("highlighted aircraft");
    assert_eq!(highlighted.id.to_string(), "a4b5c6");
    assert_eq!(highlighted.altitude_ft, 11000.0);

    let traffic: Vec<String> = state.traffic().iter().map(|r| r.id.to_string()).collect();
    assert_eq!(traffic, vec!["a1b2c3", "c0ffee"]);
}

#[tokio::test(start_paused = true)]
async fn failing_forecast_uses_file_cache_from_45_minutes_ago() {
    let spot = SpotConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::new(dir.path().join("wind.json"));
    let cached = resample(
        &[RawWindLevel {
            altitude_ft: 9880.0,
            direction_from_deg: Some(230.0),
            speed_kt: Some(22.0),
        }],
        &spot.target_altitudes_ft,
    )
    .unwrap();
    cache
        .store(&CacheEntry::new(
            cached.clone(),
            Utc::now() - chrono::Duration::minutes(45),
        ))
        .await
        .unwrap();

    let layer = ResilienceLayer::new(
        RetryPolicy::new(2, Duration::from_secs(1)),
        cache,
        Duration::from_secs(2 * 3600),
    );
    let state = AppState::new(spot, dz(), CorrelatorConfig::default());
    let attempts = Cell::new(0);

    let fetch = refresh_wind(&state, &layer, || {
        attempts.set(attempts.get() + 1);
        async { Err(anyhow::anyhow!("HTTP 502")) }
    })
    .await
    .expect("degraded success");

    assert_eq!(attempts.get(), 3);
    assert!(fetch.is_degraded());
    assert_eq!(fetch.profile(), &cached);

    let wind = state.wind();
    assert_eq!(wind.source, Some(WindSource::Cache));
    assert!(wind.solution.is_some());
    assert!(state
        .notices()
        .iter()
        .all(|n| n.severity != NoticeSeverity::Error && !n.persistent));
}
