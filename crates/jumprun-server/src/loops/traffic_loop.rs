//! Traffic polling loop.
//!
//! Polls the ADS-B relay and runs one correlator tick per batch. A failed poll
//! leaves the previous highlight and traffic untouched until the next tick.

use std::sync::Arc;

use jumprun_core::TickSummary;
use jumprun_feeds::TrafficClient;

use crate::config::Config;
use crate::loops::periodic;
use crate::state::AppState;

/// Start the traffic polling loop.
pub async fn run_traffic_loop(state: Arc<AppState>, config: Config) {
    let client = match TrafficClient::new(&config.traffic_url, config.http_timeout) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Traffic loop not started: {:#}", err);
            return;
        }
    };

    let mut ticker = periodic(config.traffic_poll);

    loop {
        ticker.tick().await;
        let _ = poll_traffic(&state, &client).await;
    }
}

/// Poll once and feed the batch to the correlator.
pub async fn poll_traffic(state: &AppState, client: &TrafficClient) -> Option<TickSummary> {
    let batch = match client.fetch_batch().await {
        Ok(batch) => batch,
        Err(err) => {
            tracing::warn!("Traffic poll failed: {:#}", err);
            return None;
        }
    };

    let summary = state.apply_traffic(batch);
    log_summary(&summary);
    Some(summary)
}

fn log_summary(summary: &TickSummary) {
    if summary.received != summary.accepted {
        tracing::debug!(
            "Dropped {} malformed aircraft record(s)",
            summary.received - summary.accepted
        );
    }
    match summary.highlighted {
        Some(id) => tracing::debug!(
            "Traffic tick: {} aircraft, {} jump candidate(s), tracking {}",
            summary.accepted,
            summary.candidates,
            id
        ),
        None => tracing::debug!(
            "Traffic tick: {} aircraft, no jump aircraft airborne",
            summary.accepted
        ),
    }
    let diff = &summary.diff;
    if !diff.inserted.is_empty() || !diff.removed.is_empty() {
        tracing::info!(
            "Traffic changed: +{} ~{} -{}",
            diff.inserted.len(),
            diff.updated.len(),
            diff.removed.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jumprun_core::{AircraftRecord, CorrelatorConfig, GeoPoint, IcaoAddress, SpotConfig};
    use std::time::Duration;

    fn hex(s: &str) -> IcaoAddress {
        s.parse().unwrap()
    }

    fn aircraft(id: &str, altitude_ft: f64) -> AircraftRecord {
        AircraftRecord {
            id: hex(id),
            lat: 42.70,
            lon: -87.95,
            altitude_ft,
            ground_speed_kt: Some(90.0),
            track_deg: Some(270.0),
            tail_number: None,
            callsign: None,
        }
    }

    #[tokio::test]
    async fn failed_poll_leaves_previous_traffic_in_place() {
        let state = AppState::new(
            SpotConfig::default(),
            GeoPoint {
                lat: 42.703153,
                lon: -87.958641,
            },
            CorrelatorConfig::new([hex("a1b2c3")]),
        );
        state.apply_traffic(vec![aircraft("a1b2c3", 9500.0), aircraft("c0ffee", 2500.0)]);
        let highlight = state.highlight();
        let traffic = state.traffic();
        let polled_at = state.last_traffic_poll();

        // Nothing listens on the discard port
        let client = TrafficClient::new(
            "http://127.0.0.1:9/v2/point/42.7/-87.9/20",
            Some(Duration::from_secs(2)),
        )
        .unwrap();

        assert!(poll_traffic(&state, &client).await.is_none());
        assert_eq!(state.highlight(), highlight);
        assert_eq!(state.traffic(), traffic);
        assert_eq!(state.last_traffic_poll(), polled_at);
    }
}
