//! Wind refresh loop.
//!
//! Fetches the pressure-level forecast on a fixed period, resamples it into a
//! profile and recomputes the jump run. This loop is the only writer of the
//! wind state.

use std::future::Future;
use std::sync::Arc;

use jumprun_core::{resample, RawWindLevel};
use jumprun_feeds::WindClient;

use crate::backoff::RetryPolicy;
use crate::cache::{FileCache, ProfileCache};
use crate::config::Config;
use crate::loops::periodic;
use crate::resilience::{ResilienceLayer, WindFetch, WindRefreshError};
use crate::state::AppState;

/// Build the resilience layer described by `config`.
pub fn resilience_layer(config: &Config) -> ResilienceLayer<FileCache> {
    ResilienceLayer::new(
        RetryPolicy::new(config.retry_count, config.retry_base),
        FileCache::new(&config.cache_path),
        config.cache_max_age,
    )
}

/// Start the wind refresh loop.
pub async fn run_wind_loop(state: Arc<AppState>, config: Config) {
    let client = match WindClient::new(&config.wind_url, config.http_timeout) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Wind loop not started: {:#}", err);
            return;
        }
    };
    let layer = resilience_layer(&config);
    let dz = state.dz();

    let mut ticker = periodic(config.wind_refresh);

    loop {
        ticker.tick().await;
        // Outcome is already logged and recorded in state
        let _ = refresh_wind(&state, &layer, || client.fetch_levels(dz.lat, dz.lon)).await;
    }
}

/// One refresh: fetch through the resilience layer, then install the profile.
pub async fn refresh_wind<C, F, Fut>(
    state: &AppState,
    layer: &ResilienceLayer<C>,
    mut fetch_levels: F,
) -> Result<WindFetch, WindRefreshError>
where
    C: ProfileCache,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<RawWindLevel>>>,
{
    let targets = &state.spot_config().target_altitudes_ft;
    let result = layer
        .fetch(move |_| {
            let levels = fetch_levels();
            async move {
                let levels = levels.await?;
                Ok::<_, anyhow::Error>(resample(&levels, targets)?)
            }
        })
        .await;

    match &result {
        Ok(fetch) => {
            match fetch {
                WindFetch::Fresh { .. } => tracing::info!("Wind profile refreshed"),
                WindFetch::Cached { age, .. } => tracing::warn!(
                    "Wind profile served from cache ({} min old)",
                    age.as_secs() / 60
                ),
            }
            match state.apply_wind(fetch) {
                Ok(solution) => tracing::info!(
                    "Jump run {:.0} deg, green light {:+.2} mi, {:.0} kt over the ground, {} s separation",
                    solution.heading_deg,
                    solution.offset_miles,
                    solution.ground_speed_kt,
                    solution.exit_separation_sec
                ),
                Err(err) => tracing::warn!("Jump run heading kept from previous profile: {}", err),
            }
        }
        Err(err) => {
            tracing::error!("{}", err);
            state.record_wind_failure(err);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, MemoryCache};
    use crate::state::NoticeSeverity;
    use chrono::Utc;
    use jumprun_core::{CorrelatorConfig, GeoPoint, SpotConfig};
    use std::cell::Cell;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::new(
            SpotConfig::default(),
            GeoPoint {
                lat: 42.703153,
                lon: -87.958641,
            },
            CorrelatorConfig::default(),
        )
    }

    fn levels(dir: f64, speed: f64) -> Vec<RawWindLevel> {
        jumprun_feeds::PRESSURE_LEVELS
            .iter()
            .map(|(_, alt)| RawWindLevel {
                altitude_ft: *alt,
                direction_from_deg: Some(dir),
                speed_kt: Some(speed),
            })
            .collect()
    }

    fn layer(cache: MemoryCache) -> ResilienceLayer<MemoryCache> {
        ResilienceLayer::new(
            RetryPolicy::new(2, Duration::from_millis(250)),
            cache,
            Duration::from_secs(2 * 3600),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_fetch_updates_solution_and_cache() {
        let state = state();
        let layer = layer(MemoryCache::default());

        let fetch = refresh_wind(&state, &layer, || async { Ok(levels(270.0, 10.0)) })
            .await
            .unwrap();

        assert!(!fetch.is_degraded());
        let solution = state.solution().unwrap();
        assert!((solution.heading_deg - 270.0).abs() < 1e-9);
        assert!(layer.cache().load().await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn three_failures_fall_back_to_cache_without_error_notice() {
        let state = state();
        let cached_profile =
            resample(&levels(250.0, 15.0), &SpotConfig::default().target_altitudes_ft).unwrap();
        let layer = layer(MemoryCache::with_entry(CacheEntry::new(
            cached_profile.clone(),
            Utc::now() - chrono::Duration::minutes(45),
        )));
        let calls = Cell::new(0);

        let fetch = refresh_wind(&state, &layer, || {
            calls.set(calls.get() + 1);
            async { Err(anyhow::anyhow!("forecast unavailable")) }
        })
        .await
        .unwrap();

        assert_eq!(calls.get(), 3);
        assert!(fetch.is_degraded());
        assert_eq!(state.wind().profile, Some(cached_profile));

        let notices = state.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, NoticeSeverity::Warning);
        assert!(!notices[0].persistent);
        assert!(notices[0].message.contains("45 min"));
    }

    #[tokio::test(start_paused = true)]
    async fn unusable_forecast_counts_as_failure() {
        let state = state();
        let layer = layer(MemoryCache::default());
        let empty = || async {
            Ok(vec![RawWindLevel {
                altitude_ft: 360.0,
                direction_from_deg: None,
                speed_kt: None,
            }])
        };

        let err = refresh_wind(&state, &layer, empty).await.unwrap_err();
        assert!(err.to_string().contains("no wind data"));
        let notices = state.notices();
        assert_eq!(notices[0].severity, NoticeSeverity::Error);
        assert!(notices[0].persistent);
        assert!(state.solution().is_none());
    }
}
