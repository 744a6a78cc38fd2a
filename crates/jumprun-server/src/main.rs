//! Jump-run server: always-on spot computation and jump aircraft tracking.
//!
//! Usage:
//!   jumprun            # same as `jumprun serve`
//!   jumprun solve      # one wind fetch, print the jump run
//!   jumprun traffic    # one traffic poll, print the correlation

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jumprun_feeds::{TrafficClient, WindClient};
use jumprun_server::config::Config;
use jumprun_server::loops::{freshness_loop, traffic_loop, wind_loop};
use jumprun_server::state::AppState;
use jumprun_server::api;

#[derive(Parser, Debug)]
#[command(author, version, about = "Jump-run spot computation and jump aircraft tracking")]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic loops and the read-only API
    Serve,
    /// Fetch winds once and print the jump-run solution
    Solve,
    /// Poll traffic once and print the correlation result
    Traffic,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let config = Config::from_env();
    let state = Arc::new(AppState::new(
        config.spot.clone(),
        config.dz,
        config.correlator_config(),
    ));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, config).await,
        Command::Solve => solve(&state, &config).await,
        Command::Traffic => traffic(&state, &config).await,
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("jumprun_server=debug".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

async fn serve(state: Arc<AppState>, config: Config) -> Result<()> {
    tracing::info!(
        "Starting jump-run server for DZ {:.5}, {:.5}",
        config.dz.lat,
        config.dz.lon
    );
    if config.jump_aircraft.is_empty() {
        tracing::warn!("No jump aircraft configured (JUMPRUN_JUMP_HEXES); nothing will be highlighted");
    }

    let port = config.server_port;

    // Start background loops
    tokio::spawn(wind_loop::run_wind_loop(state.clone(), config.clone()));
    tokio::spawn(traffic_loop::run_traffic_loop(state.clone(), config.clone()));
    tokio::spawn(freshness_loop::run_freshness_loop(state.clone(), config));

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn solve(state: &AppState, config: &Config) -> Result<()> {
    let client = WindClient::new(&config.wind_url, config.http_timeout)?;
    let layer = wind_loop::resilience_layer(config);
    let dz = state.dz();

    let fetch = wind_loop::refresh_wind(state, &layer, || client.fetch_levels(dz.lat, dz.lon)).await?;
    let wind = state.wind();

    let output = json!({
        "source": wind.source,
        "fetched_at": fetch.fetched_at(),
        "samples": fetch.profile().samples(),
        "solution": state.solution(),
        "notices": state.notices(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn traffic(state: &AppState, config: &Config) -> Result<()> {
    let client = TrafficClient::new(&config.traffic_url, config.http_timeout)?;
    let summary = traffic_loop::poll_traffic(state, &client)
        .await
        .ok_or_else(|| anyhow::anyhow!("traffic poll failed ({})", client.url()))?;

    let highlight = state.highlight();
    let output = json!({
        "received": summary.received,
        "accepted": summary.accepted,
        "candidates": summary.candidates,
        "highlighted": highlight.aircraft,
        "trailing_track": highlight.trailing_track,
        "traffic": state.traffic(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
