//! In-memory state owned by the controller.
//!
//! Each entity has exactly one writer: the wind loop writes the wind state, the
//! traffic loop writes the correlator and the traffic map, the freshness loop
//! prunes notices. Locks are held only for the duration of a synchronous update
//! and never across an await point.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use jumprun_core::{
    solve_jump_run, solve_jump_run_with_heading, AircraftCorrelator, AircraftRecord, CoreError,
    CorrelatorConfig, GeoPoint, HighlightState, IcaoAddress, JumpRunSolution, SpotConfig,
    TickSummary, WindProfile,
};

use crate::resilience::{WindFetch, WindRefreshError};

/// How long a cache-fallback notice stays visible.
pub const DEGRADED_NOTICE_TTL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSource {
    Fresh,
    Cache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Warning,
    Error,
}

/// User-facing status message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
    /// Stays until cleared by a later fresh fetch
    pub persistent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notice {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.persistent && self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Age of the wind data currently in use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindFreshness {
    pub fetched_at: DateTime<Utc>,
    pub age_minutes: i64,
    pub source: WindSource,
}

#[derive(Debug, Clone, Default)]
pub struct WindState {
    pub profile: Option<WindProfile>,
    pub source: Option<WindSource>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub solution: Option<JumpRunSolution>,
    pub freshness: Option<WindFreshness>,
}

/// Application state shared by the periodic loops and the API.
pub struct AppState {
    spot: SpotConfig,
    dz: GeoPoint,
    wind: RwLock<WindState>,
    notices: RwLock<Vec<Notice>>,
    correlator: Mutex<AircraftCorrelator>,
    highlight: RwLock<HighlightState>,
    traffic: DashMap<IcaoAddress, AircraftRecord>,
    last_traffic_poll: RwLock<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(spot: SpotConfig, dz: GeoPoint, correlator: CorrelatorConfig) -> Self {
        Self {
            spot,
            dz,
            wind: RwLock::new(WindState::default()),
            notices: RwLock::new(Vec::new()),
            correlator: Mutex::new(AircraftCorrelator::new(correlator)),
            highlight: RwLock::new(HighlightState::default()),
            traffic: DashMap::new(),
            last_traffic_poll: RwLock::new(None),
        }
    }

    pub fn dz(&self) -> GeoPoint {
        self.dz
    }

    pub fn spot_config(&self) -> &SpotConfig {
        &self.spot
    }

    // ==== Wind ====

    /// Install a newly fetched profile and recompute the jump run.
    ///
    /// The profile is always replaced. When the heading band is empty the previous
    /// heading is kept, offset and timing are recomputed from the new profile along
    /// it, and `NoWindData` is still returned.
    pub fn apply_wind(&self, fetch: &WindFetch) -> Result<JumpRunSolution, CoreError> {
        let solved = solve_jump_run(fetch.profile(), &self.spot, self.dz);
        let now = Utc::now();
        let source = if fetch.is_degraded() {
            WindSource::Cache
        } else {
            WindSource::Fresh
        };

        {
            let mut wind = write(&self.wind);
            wind.profile = Some(fetch.profile().clone());
            wind.source = Some(source);
            wind.fetched_at = Some(fetch.fetched_at());
            match &solved {
                Ok(solution) => wind.solution = Some(solution.clone()),
                Err(_) => {
                    let previous_heading = wind.solution.as_ref().map(|s| s.heading_deg);
                    if let Some(heading) = previous_heading {
                        let resolved =
                            solve_jump_run_with_heading(fetch.profile(), &self.spot, self.dz, heading);
                        match resolved {
                            Ok(solution) => wind.solution = Some(solution),
                            Err(err) => tracing::warn!("Previous jump run kept: {}", err),
                        }
                    }
                }
            }
            wind.freshness = Some(freshness_at(fetch.fetched_at(), source, now));
        }

        match fetch {
            WindFetch::Fresh { .. } => self.clear_wind_notices(),
            WindFetch::Cached { age, .. } => {
                let minutes = age.as_secs() / 60;
                self.replace_wind_notice(Notice {
                    severity: NoticeSeverity::Warning,
                    message: format!(
                        "Live winds unavailable; using cached winds from {} min ago",
                        minutes
                    ),
                    persistent: false,
                    expires_at: Some(
                        now + chrono::Duration::seconds(DEGRADED_NOTICE_TTL.as_secs() as i64),
                    ),
                });
            }
        }

        solved
    }

    /// Record a wind refresh that produced no usable data.
    pub fn record_wind_failure(&self, err: &WindRefreshError) {
        self.replace_wind_notice(Notice {
            severity: NoticeSeverity::Error,
            message: format!("Winds unavailable: {}", err),
            persistent: true,
            expires_at: None,
        });
    }

    pub fn wind(&self) -> WindState {
        read(&self.wind).clone()
    }

    pub fn solution(&self) -> Option<JumpRunSolution> {
        read(&self.wind).solution.clone()
    }

    /// Recompute the freshness label at `now`.
    pub fn refresh_freshness(&self, now: DateTime<Utc>) -> Option<WindFreshness> {
        let mut wind = write(&self.wind);
        let fetched_at = wind.fetched_at?;
        let source = wind.source.unwrap_or(WindSource::Fresh);
        let freshness = freshness_at(fetched_at, source, now);
        wind.freshness = Some(freshness.clone());
        Some(freshness)
    }

    // ==== Notices ====

    pub fn notices(&self) -> Vec<Notice> {
        read(&self.notices).clone()
    }

    /// Drop auto-dismissing notices whose time is up. Returns how many were removed.
    pub fn prune_notices(&self, now: DateTime<Utc>) -> usize {
        let mut notices = write(&self.notices);
        let before = notices.len();
        notices.retain(|n| !n.is_expired(now));
        before - notices.len()
    }

    fn clear_wind_notices(&self) {
        write(&self.notices).clear();
    }

    fn replace_wind_notice(&self, notice: Notice) {
        let mut notices = write(&self.notices);
        notices.clear();
        notices.push(notice);
    }

    // ==== Traffic ====

    /// Run one correlator tick and mirror the result for readers.
    pub fn apply_traffic(&self, batch: Vec<AircraftRecord>) -> TickSummary {
        let mut correlator = self
            .correlator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let summary = correlator.tick(batch);

        for id in &summary.diff.removed {
            self.traffic.remove(id);
        }
        for record in summary.diff.inserted.iter().chain(&summary.diff.updated) {
            self.traffic.insert(record.id, record.clone());
        }
        *write(&self.highlight) = correlator.highlight().clone();
        *write(&self.last_traffic_poll) = Some(Utc::now());

        summary
    }

    pub fn highlight(&self) -> HighlightState {
        read(&self.highlight).clone()
    }

    /// General traffic, sorted by hex.
    pub fn traffic(&self) -> Vec<AircraftRecord> {
        let mut records: Vec<AircraftRecord> =
            self.traffic.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn last_traffic_poll(&self) -> Option<DateTime<Utc>> {
        *read(&self.last_traffic_poll)
    }
}

fn freshness_at(
    fetched_at: DateTime<Utc>,
    source: WindSource,
    now: DateTime<Utc>,
) -> WindFreshness {
    WindFreshness {
        fetched_at,
        age_minutes: (now - fetched_at).num_minutes().max(0),
        source,
    }
}

// Writers never panic while holding a guard, so a poisoned lock still holds
// consistent data.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
