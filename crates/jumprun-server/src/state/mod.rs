//! Shared application state.

pub mod store;

pub use store::{AppState, Notice, NoticeSeverity, WindFreshness, WindSource, WindState};
