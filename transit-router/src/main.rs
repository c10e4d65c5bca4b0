//! Transit router command line.
//!
//! Loads (or builds) the routing network and answers a single query, or
//! forces a rebuild of the network snapshot.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use transit_router::config::{ConfigError, EngineConfig};
use transit_router::domain::Coordinates;
use transit_router::engine::{EngineError, RoutingEngine};
use transit_router::feed::GtfsDirectory;
use transit_router::planner::RouteError;

/// Public transport routing over a GTFS feed
#[derive(Parser)]
#[command(name = "transit-router", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "TRANSIT_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// GTFS directory, overriding the configuration
    #[arg(long)]
    feed: Option<PathBuf>,

    /// Snapshot file, overriding the configuration
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find a route and print it as JSON
    Route {
        /// Start point as LAT,LON
        #[arg(long, value_parser = parse_point)]
        from: Coordinates,

        /// End point as LAT,LON
        #[arg(long, value_parser = parse_point)]
        to: Coordinates,

        /// ISO-8601 departure time; selects the night network between 23:00 and 05:00
        #[arg(long)]
        at: Option<String>,
    },
    /// Discard the snapshot and rebuild the network from the feed
    Rebuild,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_point(s: &str) -> Result<Coordinates, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {s:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    Coordinates::new(lat, lon).ok_or_else(|| format!("coordinates out of range: {s}"))
}

fn load_config(cli: &Cli) -> Result<EngineConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(feed) = &cli.feed {
        config.feed_dir = feed.clone();
    }
    if let Some(snapshot) = &cli.snapshot {
        config.snapshot_path = snapshot.clone();
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let feed = Arc::new(GtfsDirectory::new(&config.feed_dir));
    let engine = RoutingEngine::new(feed, config);

    match cli.command {
        Command::Route { from, to, at } => {
            engine.load_or_build().await?;
            let itinerary = engine.find_route(from, to, at.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
        }
        Command::Rebuild => {
            engine.invalidate().await?;
            let network = engine.rebuild().await?;
            info!(
                generation = network.generation,
                stops = network.stops,
                edges = network.edges,
                "rebuild complete"
            );
            println!("{}", serde_json::to_string_pretty(&network)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "transit-router failed");
            ExitCode::FAILURE
        }
    }
}
