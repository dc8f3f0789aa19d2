use crate::config::{Strategy, load_config};
use crate::ir::{PathRequest, RequestDocument};
use crate::route_dump::write_route_dump;
use crate::routing::route_with_outcome;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "wire-route", version, about = "Orthogonal wire router for schematics")]
pub struct Args {
    /// Request JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON/JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Routing strategy
    #[arg(short = 's', long = "strategy", value_enum)]
    pub strategy: Option<Strategy>,

    /// Pixels per grid cell
    #[arg(short = 'g', long = "grid-size")]
    pub grid_size: Option<f32>,

    /// Allow the collinear-overlap stage
    #[arg(long = "enable-overlap")]
    pub enable_overlap: bool,

    /// Pretty-print the JSON output
    #[arg(long = "pretty", conflicts_with = "compact")]
    pub pretty: bool,

    /// Single-line JSON output
    #[arg(long = "compact")]
    pub compact: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.router.strategy = strategy;
    }
    if let Some(grid_size) = args.grid_size {
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(anyhow::anyhow!("--grid-size must be positive, got {grid_size}"));
        }
        config.router.grid_size = grid_size;
    }
    if args.enable_overlap {
        config.router.enable_overlap_stage = true;
    }
    if args.pretty {
        config.output.pretty = true;
    } else if args.compact {
        config.output.pretty = false;
    }

    let input = read_input(args.input.as_deref())?;
    let request = parse_request(&input, config.router.grid_size)?;

    let outcome = route_with_outcome(&request, &config.router);
    if outcome.is_fallback() {
        warn!("no stage found a clean path; emitting geometric fallback");
    } else {
        info!(stage = ?outcome.stage(), points = outcome.points.len(), "routed");
    }
    write_route_dump(args.output.as_deref(), &outcome, &config.output)
}

fn parse_request(input: &str, default_grid_size: f32) -> Result<PathRequest> {
    let parsed: RequestDocument = serde_json::from_str(input)
        .map_err(|err| anyhow::anyhow!("invalid route request: {err}"))?;
    Ok(parsed.into_path_request(default_grid_size))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Log to stderr so stdout stays clean JSON. `RUST_LOG` overrides the
/// default `warn` level.
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
