//! Freshness loop.
//!
//! Re-labels the age of the wind data in use and retires expired notices.
//! Touches nothing else.

use chrono::Utc;
use std::sync::Arc;

use crate::config::Config;
use crate::loops::periodic;
use crate::state::AppState;

pub async fn run_freshness_loop(state: Arc<AppState>, config: Config) {
    let mut ticker = periodic(config.freshness_tick);

    loop {
        ticker.tick().await;
        tick(&state);
    }
}

fn tick(state: &AppState) {
    let now = Utc::now();
    if let Some(freshness) = state.refresh_freshness(now) {
        tracing::debug!(
            "Wind data is {} min old ({:?})",
            freshness.age_minutes,
            freshness.source
        );
    }
    let pruned = state.prune_notices(now);
    if pruned > 0 {
        tracing::debug!("Dismissed {} expired notice(s)", pruned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::WindFetch;
    use crate::state::WindSource;
    use jumprun_core::{resample, CorrelatorConfig, GeoPoint, RawWindLevel, SpotConfig};
    use std::time::Duration;

    #[test]
    fn tick_relabels_age_and_dismisses_cache_notice() {
        let spot = SpotConfig::default();
        let profile = resample(
            &[RawWindLevel {
                altitude_ft: 9000.0,
                direction_from_deg: Some(200.0),
                speed_kt: Some(18.0),
            }],
            &spot.target_altitudes_ft,
        )
        .unwrap();
        let state = AppState::new(spot, GeoPoint { lat: 0.0, lon: 0.0 }, CorrelatorConfig::default());

        let fetched_at = Utc::now() - chrono::Duration::minutes(50);
        state
            .apply_wind(&WindFetch::Cached {
                profile,
                fetched_at,
                age: Duration::from_secs(50 * 60),
            })
            .unwrap();
        assert_eq!(state.notices().len(), 1);

        // Notice expiry is relative to when it was raised, so it is still live
        tick(&state);
        assert_eq!(state.notices().len(), 1);
        let freshness = state.wind().freshness.unwrap();
        assert_eq!(freshness.source, WindSource::Cache);
        assert!((50..=51).contains(&freshness.age_minutes));

        assert_eq!(state.prune_notices(Utc::now() + chrono::Duration::seconds(16)), 1);
        assert!(state.notices().is_empty());
    }
}
