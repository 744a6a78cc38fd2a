//! Server configuration from environment.

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jumprun_core::{CorrelatorConfig, GeoPoint, IcaoAddress, SpotConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub dz: GeoPoint,
    pub wind_url: String,
    pub traffic_url: String,
    pub jump_aircraft: HashSet<IcaoAddress>,
    pub tail_numbers: HashMap<IcaoAddress, String>,
    pub cache_path: PathBuf,
    pub wind_refresh: Duration,
    pub traffic_poll: Duration,
    pub freshness_tick: Duration,
    pub retry_count: u32,
    pub retry_base: Duration,
    pub cache_max_age: Duration,
    /// No explicit timeout unless configured
    pub http_timeout: Option<Duration>,
    pub spot: SpotConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let dz = GeoPoint {
            lat: parse_env("JUMPRUN_DZ_LAT", 42.703153),
            lon: parse_env("JUMPRUN_DZ_LON", -87.958641),
        };

        Self {
            server_port: parse_env("JUMPRUN_PORT", 3000),
            dz,
            wind_url: env::var("JUMPRUN_WIND_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1/forecast".to_string()),
            traffic_url: env::var("JUMPRUN_TRAFFIC_URL").unwrap_or_else(|_| {
                // 20 NM radius around the DZ
                format!("https://api.adsb.lol/v2/point/{}/{}/20", dz.lat, dz.lon)
            }),
            jump_aircraft: env::var("JUMPRUN_JUMP_HEXES")
                .map(|raw| parse_hex_list(&raw))
                .unwrap_or_default(),
            tail_numbers: env::var("JUMPRUN_TAIL_NUMBERS")
                .map(|raw| parse_tail_numbers(&raw))
                .unwrap_or_default(),
            cache_path: env::var("JUMPRUN_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("jumprun-wind-cache.json")),
            wind_refresh: Duration::from_secs(parse_env("JUMPRUN_WIND_REFRESH_SECS", 3600)),
            traffic_poll: Duration::from_secs(parse_env("JUMPRUN_TRAFFIC_POLL_SECS", 10)),
            freshness_tick: Duration::from_secs(parse_env("JUMPRUN_FRESHNESS_SECS", 60)),
            retry_count: parse_env("JUMPRUN_RETRY_COUNT", 3),
            retry_base: Duration::from_millis(parse_env("JUMPRUN_RETRY_BASE_MS", 1000)),
            cache_max_age: Duration::from_secs(parse_env("JUMPRUN_CACHE_MAX_AGE_SECS", 7200)),
            http_timeout: env::var("JUMPRUN_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            spot: SpotConfig::default(),
        }
    }

    pub fn correlator_config(&self) -> CorrelatorConfig {
        CorrelatorConfig::new(self.jump_aircraft.iter().copied())
            .with_tail_numbers(self.tail_numbers.clone())
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma separated hex addresses; unparsable entries are logged and skipped.
pub fn parse_hex_list(raw: &str) -> HashSet<IcaoAddress> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(addr) => Some(addr),
            Err(err) => {
                tracing::warn!("Ignoring jump aircraft entry: {}", err);
                None
            }
        })
        .collect()
}

/// `hex=TAIL` pairs separated by commas.
pub fn parse_tail_numbers(raw: &str) -> HashMap<IcaoAddress, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (hex, tail) = pair.split_once('=')?;
            let tail = tail.trim();
            if tail.is_empty() {
                return None;
            }
            Some((hex.trim().parse().ok()?, tail.to_string()))
        })
        .collect()
}
