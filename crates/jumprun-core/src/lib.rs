pub mod config;
pub mod correlator;
pub mod drift;
pub mod error;
pub mod geo;
pub mod ground_speed;
pub mod heading;
pub mod models;
pub mod offset;
pub mod profile;
pub mod spot;

pub use config::SpotConfig;
pub use correlator::{
    AircraftCorrelator, CorrelatorConfig, HighlightState, TickSummary, TrafficDiff,
};
pub use drift::integrate_drift;
pub use error::{CoreError, Result};
pub use geo::project_point;
pub use ground_speed::{exit_separation, ground_speed};
pub use heading::estimate_heading;
pub use models::{
    AircraftRecord, DriftVector, GeoPoint, IcaoAddress, JumpRunSolution, RawWindLevel,
    TrackPoint, WindProfile, WindSample,
};
pub use offset::{solve_offset, OffsetBreakdown};
pub use profile::resample;
pub use spot::{solve_jump_run, solve_jump_run_with_heading};
