//! REST API routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::state::{AppState, Notice, WindFreshness, WindSource};
use jumprun_core::{AircraftRecord, TrackPoint, WindSample};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/wind", get(get_wind))
        .route("/v1/solution", get(get_solution))
        .route("/v1/traffic", get(get_traffic))
        .route("/v1/notices", get(get_notices))
}

#[derive(Debug, Serialize)]
struct WindResponse {
    samples: Vec<WindSample>,
    source: Option<WindSource>,
    fetched_at: Option<DateTime<Utc>>,
    freshness: Option<WindFreshness>,
}

async fn get_wind(State(state): State<Arc<AppState>>) -> Json<WindResponse> {
    let wind = state.wind();
    Json(WindResponse {
        samples: wind
            .profile
            .map(|p| p.samples().to_vec())
            .unwrap_or_default(),
        source: wind.source,
        fetched_at: wind.fetched_at,
        freshness: wind.freshness,
    })
}

async fn get_solution(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.solution() {
        Some(solution) => (StatusCode::OK, Json(json!(solution))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No jump run computed yet" })),
        ),
    }
}

#[derive(Debug, Serialize)]
struct TrafficResponse {
    highlighted: Option<AircraftRecord>,
    trailing_track: VecDeque<TrackPoint>,
    traffic: Vec<AircraftRecord>,
    last_poll: Option<DateTime<Utc>>,
}

async fn get_traffic(State(state): State<Arc<AppState>>) -> Json<TrafficResponse> {
    let highlight = state.highlight();
    Json(TrafficResponse {
        highlighted: highlight.aircraft,
        trailing_track: highlight.trailing_track,
        traffic: state.traffic(),
        last_poll: state.last_traffic_poll(),
    })
}

async fn get_notices(State(state): State<Arc<AppState>>) -> Json<Vec<Notice>> {
    Json(state.notices())
}
