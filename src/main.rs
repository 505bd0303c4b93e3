use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use wpansim::config_loader::{self, CliOverrides};
use wpansim::orchestrator;
use wpansim::presets::Preset;
use wpansim::utils::duration::parse_duration;

/// Scenario builder for LR-WPAN/6LoWPAN ping simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a scenario configuration YAML file (overrides --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in scenario variant used when no configuration file is given
    #[arg(short, long, value_enum, default_value_t = Preset::AllPairs)]
    preset: Preset,

    /// Number of ordinary nodes
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Simulated stop time (e.g. "100s", "2m", "1m 30s")
    #[arg(long, value_parser = parse_duration)]
    stop_time: Option<Duration>,

    /// Output directory for the simulation plan and participant registry
    #[arg(short, long, default_value = "wpansim_output")]
    output: PathBuf,

    /// Do not print the per-node diagnostics table
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            node_count: self.nodes,
            stop_time: self.stop_time,
            diagnostics: self.quiet.then_some(false),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting wpansim scenario builder");
    info!("Output directory: {:?}", args.output);

    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => {
            info!("Using preset {:?}", args.preset);
            args.preset.config()
        }
    };
    config_loader::apply_cli_overrides(&mut config, &args.overrides())
        .wrap_err("Invalid command-line override")?;

    orchestrator::generate_scenario(&config, &args.output)?;

    info!("Scenario generation completed successfully");
    Ok(())
}
