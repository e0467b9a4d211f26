use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mariner_lib::{DistanceOracle, ReferenceData, RoutingEngine, WrapperCommand};

mod commands;
mod output;

use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Maritime distance and EU ETS compliance-cost estimation")]
struct Cli {
    /// Directory containing ports.json, mrv_data.csv, and ets_price.csv.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Path to the external routing engine JAR.
    #[arg(long, default_value = "searoute-engine/searoute.jar")]
    jar: PathBuf,

    /// Java executable used to launch the engine.
    #[arg(long, default_value = "java")]
    java: PathBuf,

    /// Engine network-graph resolution in kilometres.
    #[arg(long, default_value_t = 20)]
    resolution: u32,

    /// Bound on a single routing subprocess call, in seconds.
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Optional wrapper command tried when the engine fails.
    #[arg(long)]
    wrapper_cmd: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the port table by name, country code, or region.
    Search {
        /// Free-text query (at least two characters).
        query: String,
        /// Maximum number of matches to return.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Resolve the maritime distance between two ports or raw coordinates.
    Distance {
        /// Origin port name.
        #[arg(long, conflicts_with = "coords", requires = "to")]
        from: Option<String>,
        /// Destination port name.
        #[arg(long, conflicts_with = "coords", requires = "from")]
        to: Option<String>,
        /// Raw coordinates: origin lon, origin lat, dest lon, dest lat.
        #[arg(long, num_args = 4, allow_negative_numbers = true,
              value_names = ["OLON", "OLAT", "DLON", "DLAT"])]
        coords: Option<Vec<f64>>,
    },
    /// Estimate the per-year EU ETS cost for a ship on a voyage.
    Cost {
        /// IMO number of the ship to price.
        #[arg(long)]
        imo: String,
        /// Origin port name.
        #[arg(long, conflicts_with = "coords", requires = "to")]
        from: Option<String>,
        /// Destination port name.
        #[arg(long, conflicts_with = "coords", requires = "from")]
        to: Option<String>,
        /// Raw coordinates: origin lon, origin lat, dest lon, dest lat.
        #[arg(long, num_args = 4, allow_negative_numbers = true,
              value_names = ["OLON", "OLAT", "DLON", "DLAT"])]
        coords: Option<Vec<f64>>,
        /// Treat the raw-coordinate origin as an EEA port.
        #[arg(long, requires = "coords")]
        origin_eea: bool,
        /// Treat the raw-coordinate destination as an EEA port.
        #[arg(long, requires = "coords")]
        dest_eea: bool,
        /// Fall back to the fleet-median intensity when the IMO is absent.
        #[arg(long)]
        fleet_median: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let data = ReferenceData::load(&cli.data_dir);

    match cli.command {
        Command::Search { ref query, limit } => {
            commands::search::run(&data, cli.format, query, limit)
        }
        Command::Distance {
            ref from,
            ref to,
            ref coords,
        } => {
            let oracle = build_oracle(&cli);
            commands::distance::run(
                &data,
                &oracle,
                cli.format,
                from.as_deref(),
                to.as_deref(),
                coords.as_deref(),
            )
        }
        Command::Cost {
            ref imo,
            ref from,
            ref to,
            ref coords,
            origin_eea,
            dest_eea,
            fleet_median,
        } => {
            let oracle = build_oracle(&cli);
            let args = commands::cost::CostArgs {
                imo,
                from: from.as_deref(),
                to: to.as_deref(),
                coords: coords.as_deref(),
                origin_eea,
                dest_eea,
                fleet_median,
            };
            commands::cost::run(&data, &oracle, cli.format, &args)
        }
    }
}

/// Build the distance chain, probing external strategies once and reporting
/// anything unavailable loudly here instead of per-request.
fn build_oracle(cli: &Cli) -> DistanceOracle {
    let timeout = Duration::from_secs(cli.timeout_secs);

    let engine = match RoutingEngine::probe(&cli.java, &cli.jar, cli.resolution, timeout) {
        Ok(engine) => Some(engine),
        Err(err) => {
            warn!(%err, "routing engine unavailable; distances will fall back");
            None
        }
    };

    let wrapper = cli.wrapper_cmd.as_deref().and_then(|program| {
        match WrapperCommand::probe(program, timeout) {
            Ok(wrapper) => Some(wrapper),
            Err(err) => {
                warn!(%err, "wrapper command unavailable; skipping it in the chain");
                None
            }
        }
    });

    DistanceOracle::new(engine, wrapper)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
