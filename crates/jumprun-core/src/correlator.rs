//! Jump-aircraft selection and traffic tracking over polled batches.
//!
//! Every poll is a full resync: the batch is filtered, jump candidates are split
//! from general traffic, the highest candidate becomes the highlighted aircraft and
//! the general traffic mapping is diffed against the previous poll. Nothing is
//! assumed about ordering or delivery between polls.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{AircraftRecord, IcaoAddress, TrackPoint};

pub const DEFAULT_TRACK_CAPACITY: usize = 200;
pub const MIN_ALTITUDE_FT: f64 = 0.0;
pub const MAX_ALTITUDE_FT: f64 = 50_000.0;

/// Which aircraft are jump aircraft and what they are called.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelatorConfig {
    pub jump_aircraft: HashSet<IcaoAddress>,
    #[serde(default)]
    pub tail_numbers: HashMap<IcaoAddress, String>,
    #[serde(default = "default_track_capacity")]
    pub track_capacity: usize,
}

fn default_track_capacity() -> usize {
    DEFAULT_TRACK_CAPACITY
}

impl CorrelatorConfig {
    pub fn new(jump_aircraft: impl IntoIterator<Item = IcaoAddress>) -> Self {
        Self {
            jump_aircraft: jump_aircraft.into_iter().collect(),
            tail_numbers: HashMap::new(),
            track_capacity: DEFAULT_TRACK_CAPACITY,
        }
    }

    pub fn with_tail_numbers(mut self, tail_numbers: HashMap<IcaoAddress, String>) -> Self {
        self.tail_numbers = tail_numbers;
        self
    }
}

/// The highlighted jump aircraft and its recent positions (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightState {
    pub aircraft: Option<AircraftRecord>,
    pub trailing_track: VecDeque<TrackPoint>,
}

impl HighlightState {
    fn clear(&mut self) {
        self.aircraft = None;
        self.trailing_track.clear();
    }
}

/// Changes to the general traffic mapping produced by one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficDiff {
    pub inserted: Vec<AircraftRecord>,
    pub updated: Vec<AircraftRecord>,
    pub removed: Vec<IcaoAddress>,
}

/// Outcome of one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    pub received: usize,
    pub accepted: usize,
    pub candidates: usize,
    pub highlighted: Option<IcaoAddress>,
    pub diff: TrafficDiff,
}

pub struct AircraftCorrelator {
    config: CorrelatorConfig,
    highlight: HighlightState,
    traffic: HashMap<IcaoAddress, AircraftRecord>,
}

impl AircraftCorrelator {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self {
            config,
            highlight: HighlightState::default(),
            traffic: HashMap::new(),
        }
    }

    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    /// General traffic, excluding the highlighted aircraft.
    pub fn traffic(&self) -> &HashMap<IcaoAddress, AircraftRecord> {
        &self.traffic
    }

    /// Apply one polled batch.
    pub fn tick(&mut self, batch: Vec<AircraftRecord>) -> TickSummary {
        let received = batch.len();
        let accepted: Vec<AircraftRecord> = batch
            .into_iter()
            .filter(is_valid_record)
            .map(|record| self.with_tail_number(record))
            .collect();

        let (candidates, general): (Vec<AircraftRecord>, Vec<AircraftRecord>) = accepted
            .iter()
            .cloned()
            .partition(|record| self.config.jump_aircraft.contains(&record.id));

        let candidate_count = candidates.len();
        let selected = select_highest(&candidates).cloned();
        self.update_highlight(selected);

        let highlighted = self.highlight.aircraft.as_ref().map(|a| a.id);
        let mut next: Vec<AircraftRecord> = general;
        next.extend(
            candidates
                .into_iter()
                .filter(|record| Some(record.id) != highlighted),
        );
        let diff = self.resync_traffic(next);

        TickSummary {
            received,
            accepted: accepted.len(),
            candidates: candidate_count,
            highlighted,
            diff,
        }
    }

    fn with_tail_number(&self, mut record: AircraftRecord) -> AircraftRecord {
        if let Some(tail) = self.config.tail_numbers.get(&record.id) {
            record.tail_number = Some(tail.clone());
        }
        record
    }

    fn update_highlight(&mut self, selected: Option<AircraftRecord>) {
        let Some(aircraft) = selected else {
            self.highlight.clear();
            return;
        };

        let same_aircraft = self
            .highlight
            .aircraft
            .as_ref()
            .is_some_and(|current| current.id == aircraft.id);
        if !same_aircraft {
            self.highlight.trailing_track.clear();
        }

        let point = aircraft.position();
        if self.highlight.trailing_track.back() != Some(&point) {
            self.highlight.trailing_track.push_back(point);
        }
        while self.highlight.trailing_track.len() > self.config.track_capacity {
            self.highlight.trailing_track.pop_front();
        }
        self.highlight.aircraft = Some(aircraft);
    }

    fn resync_traffic(&mut self, records: Vec<AircraftRecord>) -> TrafficDiff {
        let mut diff = TrafficDiff::default();

        // Later reports of the same hex within one batch win
        let latest: HashMap<IcaoAddress, AircraftRecord> =
            records.into_iter().map(|record| (record.id, record)).collect();

        self.traffic.retain(|id, _| {
            let keep = latest.contains_key(id);
            if !keep {
                diff.removed.push(*id);
            }
            keep
        });

        for (id, record) in latest {
            match self.traffic.insert(id, record.clone()) {
                Some(_) => diff.updated.push(record),
                None => diff.inserted.push(record),
            }
        }

        diff.inserted.sort_by_key(|r| r.id);
        diff.updated.sort_by_key(|r| r.id);
        diff.removed.sort();
        diff
    }
}

fn is_valid_record(record: &AircraftRecord) -> bool {
    record.lat.is_finite()
        && record.lon.is_finite()
        && (-90.0..=90.0).contains(&record.lat)
        && (-180.0..=180.0).contains(&record.lon)
        && record.altitude_ft.is_finite()
        && (MIN_ALTITUDE_FT..=MAX_ALTITUDE_FT).contains(&record.altitude_ft)
}

/// Highest candidate; equal altitudes go to the earliest in the batch.
fn select_highest(candidates: &[AircraftRecord]) -> Option<&AircraftRecord> {
    let mut best: Option<&AircraftRecord> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.altitude_ft <= current.altitude_ft => {}
            _ => best = Some(candidate),
        }
    }
    best
}
