//! Background loops for continuous processing.

pub mod freshness_loop;
pub mod traffic_loop;
pub mod wind_loop;

use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Ticker shared by the loops: first tick fires immediately, and a slow
/// iteration delays the schedule instead of bursting to catch up.
pub(crate) fn periodic(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
