//! Jumprun feeds - weather forecast and ADS-B traffic clients
//!
//! Handles all HTTP communication with external data sources and normalizes
//! their payloads into core types.

pub mod traffic;
pub mod wind;

pub use traffic::{normalize_batch, TrafficClient};
pub use wind::{parse_forecast, ForecastResponse, WindClient, PRESSURE_LEVELS};
